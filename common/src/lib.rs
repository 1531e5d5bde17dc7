//! Wire types shared by the minesweeper session server and its clients.
//!
//! [`models`] holds the board and score shapes, [`protocol`] the request and
//! response bodies exchanged over HTTP.

pub mod models;
pub mod protocol;
