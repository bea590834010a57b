use crate::commands::{build_runtime, load_config, open_database, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    match execute() {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}

fn execute() -> Result<(), CommandFailure> {
    let config = load_config()?;
    let runtime = build_runtime()?;

    runtime.block_on(async {
        let pool = open_database(&config).await?;
        pool.close().await;
        Ok(())
    })
}
