#![allow(dead_code)]

pub mod websocket;
