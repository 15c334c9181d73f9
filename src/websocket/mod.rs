//! WebSocket Entry Point
//!
//! Clients connect to `/ws` with the room and nickname as query parameters:
//!
//! - `room` - room to join; the default room when absent or blank
//! - `nick` - nickname; "Anonymous" when absent or blank
//!
//! Every text or binary frame a client sends is broadcast to the room. The
//! client receives one text frame per message: `<nick>: <text>` for chat
//! messages and the bare notice for joins, leaves and room shutdown.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws?room=general&nick=alice');
//!
//! ws.onopen = () => ws.send('hello everyone');
//! ws.onmessage = (event) => console.log(event.data);
//! ```

mod handler;

pub use handler::websocket_handler;
