use shoplist_backends::{connect_with_settings, migrations};

use crate::commands::{load_config, runtime, CommandResult, BACKEND_EXIT};

const COMMAND: &str = "migrate";

/// Applies the to-do store migrations to `todo.database_url`, whichever
/// backend is currently selected.
pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.todo.database_url,
            config.todo.max_connections,
            config.backend.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), BACKEND_EXIT))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), BACKEND_EXIT + 1))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            COMMAND,
            format!("applied pending migrations to `{}`", config.todo.database_url),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}
