use super::{Context, PadArgs, SubmodeHandler};

/// Pan is shown on the pads but only changed with the knobs.
#[derive(Default)]
pub(crate) struct PanMode;

impl SubmodeHandler for PanMode {
    fn on_pad(&mut self, _args: &PadArgs, _cx: &mut Context) -> bool {
        false
    }
}
