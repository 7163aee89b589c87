pub mod api;
pub mod core;

/// Installs `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}
