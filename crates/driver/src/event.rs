use rosc::OscMessage;

/// Everything the dispatch loop reacts to. Producers live on other threads.
#[derive(Debug)]
pub(crate) enum Event {
    Midi(Vec<u8>),
    Osc(OscMessage),
    Shutdown,
}
