use hospital_dispatch::config::{Config, Mode};
use hospital_dispatch::display::{print_assignment, write_assignment_to_file};
use hospital_dispatch::parser::{load_cases, load_hospitals};
use hospital_dispatch::{run_assignment, web};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    match config.mode {
        Mode::Web { port } => {
            info!(port, "Starting web server");
            println!("Access the API at http://localhost:{}/api/assignments", port);
            web::start_server(port, config.city_center).await?;
        }
        Mode::Cli { cases_path, hospitals_path, output_path } => {
            info!(path = %cases_path.display(), "Loading cases");
            let cases = load_cases(&cases_path, config.city_center)?;
            info!(path = %hospitals_path.display(), "Loading hospitals");
            let hospitals = load_hospitals(&hospitals_path, config.city_center)?;

            println!("Loaded {} cases and {} hospitals", cases.len(), hospitals.len());

            println!("\n\n=== Running Assignment ===");
            let run = run_assignment(&cases, &hospitals);
            print_assignment(&run, &hospitals);

            write_assignment_to_file(&run, &output_path)?;
            println!("\nAssignments saved to {}", output_path.display());
        }
    }

    Ok(())
}
