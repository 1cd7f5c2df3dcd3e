use crate::commands::{exit_codes, prepare, CommandResult};
use showroom_db::{connect, migrations, SeedDataset, VehicleSeedInfo};

struct SeedOutput {
    vehicles: Vec<VehicleSeedInfo>,
}

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(parts) => parts,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), exit_codes::CONNECTIVITY))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), exit_codes::EXECUTION))?;

        let seed_result = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), exit_codes::EXECUTION))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), exit_codes::VERIFICATION))?;

        let run_result: Result<SeedOutput, (&'static str, String, u8)> =
            if !verification.all_present {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                    .collect::<Vec<_>>();
                let message = if failed_checks.is_empty() {
                    "some seed data failed to load".to_string()
                } else {
                    format!("seed verification failed for checks: {}", failed_checks.join(", "))
                };
                Err(("seed_verification", message, exit_codes::VERIFICATION))
            } else {
                Ok(SeedOutput { vehicles: seed_result.vehicles_seeded })
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let vehicle_lines: Vec<String> = output
                .vehicles
                .iter()
                .map(|v| format!("{} {} ({} units)", v.model, v.variant, v.stock_units))
                .collect();
            CommandResult::success(
                "seed",
                format!("loaded dealership seed dataset: {}", vehicle_lines.join(", ")),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
