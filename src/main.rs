use anyhow::Result;
use rand::Rng;
use std::sync::Arc;

use goldmine::config::Config;
use goldmine::logging::{log, log_server_started, obj, v_str, Domain, Level};
use goldmine::server;
use goldmine::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let seed = cfg.history_seed.unwrap_or_else(|| rand::thread_rng().gen());

    let state = match AppState::from_config(&cfg, seed) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            log(
                Level::Fatal,
                Domain::System,
                "startup_failed",
                obj(&[("msg", v_str(&err.to_string()))]),
            );
            return Err(err);
        }
    };

    let addr = cfg.bind_addr();
    log_server_started(&addr, state.snapshot().historical_records);
    server::serve(state, &addr).await
}
