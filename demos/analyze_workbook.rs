use financial_statement_analyzer::{
    analyze_workbook, convert_entries_to_workbook, methodology_markdown, AnalysisConfig,
    StatementEntry, StatementSheet, Workbook,
};

fn sample_entries() -> Vec<StatementEntry> {
    let rows: [(StatementSheet, &str, [f64; 2]); 16] = [
        (StatementSheet::BalanceSheet, "TỔNG TÀI SẢN", [900.0, 1000.0]),
        (StatementSheet::BalanceSheet, "VỐN CHỦ SỞ HỮU", [350.0, 400.0]),
        (StatementSheet::BalanceSheet, "TÀI SẢN NGẮN HẠN", [450.0, 500.0]),
        (StatementSheet::BalanceSheet, "Hàng tồn kho", [90.0, 100.0]),
        (StatementSheet::BalanceSheet, "Tiền và tương đương tiền", [60.0, 80.0]),
        (StatementSheet::BalanceSheet, "Các khoản phải thu", [120.0, 150.0]),
        (StatementSheet::BalanceSheet, "Nợ ngắn hạn", [225.0, 250.0]),
        (StatementSheet::BalanceSheet, "Vay ngắn hạn", [90.0, 100.0]),
        (StatementSheet::BalanceSheet, "Vay dài hạn", [40.0, 50.0]),
        (StatementSheet::BalanceSheet, "Vốn góp", [200_000.0, 200_000.0]),
        (StatementSheet::IncomeStatement, "Doanh số thuần", [1825.0, 3650.0]),
        (StatementSheet::IncomeStatement, "Giá vốn hàng bán", [-1460.0, -2920.0]),
        (StatementSheet::IncomeStatement, "Lãi gộp", [365.0, 730.0]),
        (StatementSheet::IncomeStatement, "EBIT", [150.0, 250.0]),
        (StatementSheet::IncomeStatement, "Lãi/(lỗ) thuần sau thuế", [100.0, 180.0]),
        (StatementSheet::CashFlow, "Khấu hao", [-40.0, -50.0]),
    ];

    rows.iter()
        .flat_map(|(sheet, name, values)| {
            [2022, 2023]
                .into_iter()
                .zip(values.iter())
                .map(move |(year, value)| StatementEntry {
                    sheet: *sheet,
                    line_item: name.to_string(),
                    year,
                    value: *value,
                })
        })
        .collect()
}

fn load_workbook(path: Option<String>) -> anyhow::Result<Workbook> {
    let Some(path) = path else {
        println!("No input given; using the built-in sample company.\n");
        return Ok(convert_entries_to_workbook(&sample_entries()));
    };

    #[cfg(feature = "xlsx")]
    {
        if !std::path::Path::new(&path).is_dir() {
            return Ok(Workbook::open_spreadsheet(&path)?);
        }
    }

    Ok(Workbook::from_csv_dir(&path)?)
}

fn main() -> anyhow::Result<()> {
    let workbook = load_workbook(std::env::args().nth(1))?;
    let config = AnalysisConfig::default();
    let outcome = analyze_workbook(&workbook, &config)?;

    println!("{}", outcome.summary_table().to_markdown());

    if let Some(composition) = outcome.latest_composition() {
        for breakdown in [&composition.assets, &composition.funding_sources] {
            println!("## {} ({})\n", breakdown.kind.title(), breakdown.year);
            for slice in &breakdown.slices {
                println!(" - {}: {:.2} ({:.1}%)", slice.label, slice.value, slice.share * 100.0);
            }
            println!();
        }
    }

    for chart in outcome.trend_charts() {
        println!("{}:", chart.title);
        for series in &chart.series {
            let points: Vec<String> = chart
                .x
                .iter()
                .zip(&series.values)
                .map(|(year, value)| match value {
                    Some(v) => format!("{}={:.4}", year, v),
                    None => format!("{}=gap", year),
                })
                .collect();
            println!("  {:<24} {}", series.name, points.join("  "));
        }
    }

    println!("\n{}", methodology_markdown());
    Ok(())
}
