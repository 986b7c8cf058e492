use stress_test::{stress_test_feed, stress_test_folder, stress_test_scaling, StressResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> StressResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> StressResult<()> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            EDIT HISTORY STRESS TESTS                       ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: a small folder, few writers
    let (_, stats) = stress_test_folder("small", 3, 100, 1).await?;
    stats.print();

    // Test 2: more writers than the history keeps
    let (_, stats) = stress_test_folder("crowded", 25, 1000, 2).await?;
    stats.print();

    // Test 3: several folders ranked in one feed
    stress_test_feed(15, 8, 300).await?;

    // Test 4: scaling with history length
    stress_test_scaling(2000, 500).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
