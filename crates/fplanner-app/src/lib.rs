// Application layer: the connected session, the orchestrator event loop and
// the message types exchanged with the terminal UI.

pub mod app;
pub mod protocol;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
