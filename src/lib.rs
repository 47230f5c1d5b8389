//! Client core for IdeaBox, the internal idea-submission and review
//! tool. Persistence, authentication and row-level authorization live
//! in the managed data backend; this crate holds the typed row model,
//! the in-process session store, the HTTP gateway, the session
//! bootstrap controller and the mutation operations the screens call.

pub mod actions;
pub mod backend;
pub mod config;
pub mod controller;
pub mod domain;
pub mod gateway;
pub mod routes;
pub mod store;
pub mod time_utils;

#[cfg(test)]
pub mod testing;
