use env_logger::{Builder, Env};
use log::LevelFilter;

pub(crate) fn init_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("apc_sl_driver=info,apc_library=info"));
    builder.filter_module("midir", LevelFilter::Warn);
    let _ = builder.try_init();
}
