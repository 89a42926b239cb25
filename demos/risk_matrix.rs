use financial_statement_analyzer::{build_risk_matrix, Scenario};

fn main() -> anyhow::Result<()> {
    let base_value: f64 = match std::env::args().nth(1) {
        Some(raw) => raw.parse()?,
        None => 10_000.0,
    };

    let matrix = build_risk_matrix(base_value)?;

    println!("{}", matrix.to_markdown());

    for scenario in Scenario::ALL {
        let result = matrix.scenario(scenario);
        println!("{:<32} {:>14.2}", scenario.label(), result.value);
    }

    println!("\nCSV export:\n{}", matrix.to_csv()?);
    Ok(())
}
