use crate::config::AppConfig;
use crate::error::StudyError;
use crate::worldbank::IndicatorSource;
use script_kit::{
    charts::{init_fonts, CorrelationFigure, Figure, RegressionFigure},
    models::{FolderSpec, IndicatorTable, RowView},
    services::{write_table, FigurePersister, FolderResolver},
    utils::{CorrelationMatrix, LinearFit},
    Logger, Timer,
};
use std::path::PathBuf;

pub const CORRELATION_TITLE: &str = "Pairwise correlations of scientific outcome";
pub const LINEAR_RELATION: &str = "Linear relation";

/// `"{prefix}for {x} vs {y}"`, no space before "for" as in the saved figure names.
pub fn pair_title(prefix: &str, x: &str, y: &str) -> String {
    format!("{}for {} vs {}", prefix, x, y)
}

struct DerivedColumn {
    name: &'static str,
    inputs: &'static [&'static str],
    derive: fn(&RowView<'_>) -> Option<f64>,
}

fn rd_expend_per_pop(row: &RowView<'_>) -> Option<f64> {
    Some(row.get("rd_expend_per_gdp")? * row.get("GDP")? / row.get("population")?)
}

fn scientific_articles_per_pop(row: &RowView<'_>) -> Option<f64> {
    Some(row.get("scientific_articles")? / row.get("population")?)
}

fn scientific_articles_per_gdp(row: &RowView<'_>) -> Option<f64> {
    Some(row.get("scientific_articles")? / row.get("GDP")?)
}

const DERIVED_COLUMNS: &[DerivedColumn] = &[
    DerivedColumn {
        name: "rd_expend_per_pop",
        inputs: &["rd_expend_per_gdp", "GDP", "population"],
        derive: rd_expend_per_pop,
    },
    DerivedColumn {
        name: "scientific_articles_per_pop",
        inputs: &["scientific_articles", "population"],
        derive: scientific_articles_per_pop,
    },
    DerivedColumn {
        name: "scientific_articles_per_gdp",
        inputs: &["scientific_articles", "GDP"],
        derive: scientific_articles_per_gdp,
    },
];

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct StudyOutcome {
    pub folders: FolderSpec,
    pub table: IndicatorTable,
    pub dropped_rows: usize,
    pub correlations: CorrelationMatrix,
    pub regressions: Vec<LinearFit>,
    /// Figures written to disk; empty when figure saving is off.
    pub figures: Vec<PathBuf>,
    pub result_file: PathBuf,
}

fn add_derived_columns(table: &mut IndicatorTable, logger: &Logger) -> Result<(), StudyError> {
    for column in DERIVED_COLUMNS {
        let missing: Vec<&str> = column
            .inputs
            .iter()
            .copied()
            .filter(|input| !table.columns().iter().any(|c| c == input))
            .collect();
        if !missing.is_empty() {
            logger.warn(&format!("Skipping {}, missing {:?}", column.name, missing));
            continue;
        }
        table.add_derived(column.name, column.derive)?;
    }
    Ok(())
}

/// Column pairs to draw regression plots for: the configured pair, then every
/// other pair when `all_pairs` is set.
fn regression_pairs(
    config: &AppConfig,
    table: &IndicatorTable,
    logger: &Logger,
) -> Vec<(String, String)> {
    let has = |name: &str| table.columns().iter().any(|c| c == name);
    let primary = (config.regression_x.clone(), config.regression_y.clone());

    let mut pairs = Vec::new();
    if has(&primary.0) && has(&primary.1) {
        pairs.push(primary.clone());
    } else {
        logger.warn(&format!(
            "Skipping regression {} vs {}, column not in table",
            primary.0, primary.1
        ));
    }

    if config.all_pairs {
        pairs.extend(
            table
                .column_pairs()
                .into_iter()
                .filter(|pair| *pair != primary),
        );
    }
    pairs
}

fn persist(
    persister: &mut Option<FigurePersister>,
    figure: &dyn Figure,
    saved: &mut Vec<PathBuf>,
) -> Result<(), StudyError> {
    if let Some(persister) = persister {
        saved.push(persister.save(figure)?);
    }
    Ok(())
}

/// The analysis: read, clean, calculate, visualize, store.
pub async fn run(
    config: &AppConfig,
    source: &dyn IndicatorSource,
) -> Result<StudyOutcome, StudyError> {
    let logger = Logger::new("STUDY");
    let timer = Timer::start("study");

    // SETTINGS
    let folders = FolderResolver::new(&config.root, config.folder_layout()).resolve()?;
    let fig_dir = folders
        .fig()
        .ok_or_else(|| StudyError::Config("folder layout has no fig folder".to_string()))?
        .to_path_buf();
    let result_file = folders
        .result_file()
        .ok_or_else(|| StudyError::Config("folder layout has no result file".to_string()))?
        .to_path_buf();
    logger.info(&format!(
        "Saving figures: {} (name collisions: {})",
        config.save_figures,
        config.collision_policy.as_str()
    ));

    // READ DATA
    let mut table = source.fetch(&config.indicators, config.year).await?;

    // ORGANIZE/CLEAN DATA
    let dropped_rows = table.drop_incomplete();
    logger.info(&format!(
        "Dropped {} incomplete rows, {} left",
        dropped_rows,
        table.len()
    ));

    // CALCULATIONS
    logger.info("Calculate results...");
    add_derived_columns(&mut table, &logger)?;

    // VISUALIZE
    logger.info("Visualizing results...");
    let mut persister = if config.save_figures {
        init_fonts(config.font_path.as_deref());
        Some(FigurePersister::new(&fig_dir, config.figure, config.collision_policy))
    } else {
        None
    };
    let mut figures = Vec::new();

    let correlation = CorrelationFigure::from_table(CORRELATION_TITLE, &table)?;
    persist(&mut persister, &correlation, &mut figures)?;

    let mut regressions = Vec::new();
    for (x, y) in regression_pairs(config, &table, &logger) {
        let title = pair_title(LINEAR_RELATION, &x, &y);
        let figure = RegressionFigure::from_table(&title, &table, &x, &y)?;
        match figure.fit() {
            Some(fit) => regressions.push(fit.clone()),
            None => logger.warn(&format!("No regression for {} vs {}, too few points", x, y)),
        }
        persist(&mut persister, &figure, &mut figures)?;
    }

    // STORE
    logger.info("Saving...");
    write_table(&table, &result_file)?;

    timer.log_elapsed("STUDY");
    logger.info("Analysis completed");

    Ok(StudyOutcome {
        folders,
        table,
        dropped_rows,
        correlations: correlation.matrix().clone(),
        regressions,
        figures,
        result_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{science_indicators, Indicator};
    use async_trait::async_trait;
    use script_kit::charts::FigureOptions;
    use script_kit::services::{read_table, CollisionPolicy};

    struct FakeSource {
        rows: Vec<(&'static str, [Option<f64>; 4])>,
    }

    #[async_trait]
    impl IndicatorSource for FakeSource {
        async fn fetch(
            &self,
            indicators: &[Indicator],
            _year: i32,
        ) -> Result<IndicatorTable, StudyError> {
            let mut table = IndicatorTable::new(
                "country",
                indicators.iter().map(|i| i.name.clone()).collect(),
            );
            for (label, values) in &self.rows {
                table.push_row(label, values[..indicators.len()].to_vec())?;
            }
            Ok(table)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl IndicatorSource for FailingSource {
        async fn fetch(
            &self,
            indicators: &[Indicator],
            _year: i32,
        ) -> Result<IndicatorTable, StudyError> {
            Err(StudyError::ApiResponse {
                indicator: indicators[0].code.clone(),
                message: "HTTP 503 Service Unavailable".to_string(),
            })
        }
    }

    // GDP, population, scientific_articles, rd_expend_per_gdp
    fn source() -> FakeSource {
        FakeSource {
            rows: vec![
                ("AUT", [Some(3.9e11), Some(8.3e6), Some(4_500.0), Some(2.4)]),
                ("DEU", [Some(3.4e12), Some(8.2e7), Some(44_000.0), Some(2.5)]),
                ("FIN", [Some(2.5e11), Some(5.3e6), Some(4_800.0), Some(3.4)]),
                ("MEX", [Some(1.0e12), Some(1.1e8), Some(4_200.0), Some(0.4)]),
                ("TCD", [Some(7.0e9), Some(1.1e7), None, None]),
            ],
        }
    }

    fn config(root: &std::path::Path) -> AppConfig {
        AppConfig {
            root: root.to_path_buf(),
            save_figures: false,
            figure: FigureOptions {
                width_in: 3.0,
                height_in: 2.0,
                dpi: 50,
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_pair_title() {
        assert_eq!(
            pair_title(LINEAR_RELATION, "rd_expend_per_gdp", "scientific_articles_per_gdp"),
            "Linear relationfor rd_expend_per_gdp vs scientific_articles_per_gdp"
        );
    }

    #[tokio::test]
    async fn test_run_without_figures() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(&config(dir.path()), &source()).await.unwrap();

        assert_eq!(outcome.dropped_rows, 1);
        assert_eq!(outcome.table.index(), &["AUT", "DEU", "FIN", "MEX"]);
        assert_eq!(
            outcome.table.columns(),
            &[
                "GDP",
                "population",
                "scientific_articles",
                "rd_expend_per_gdp",
                "rd_expend_per_pop",
                "scientific_articles_per_pop",
                "scientific_articles_per_gdp",
            ]
        );
        let per_pop = outcome.table.value("AUT", "rd_expend_per_pop").unwrap().unwrap();
        assert!((per_pop - 2.4 * 3.9e11 / 8.3e6).abs() < 1e-6);

        assert_eq!(outcome.regressions.len(), 1);
        assert_eq!(outcome.regressions[0].x, "rd_expend_per_gdp");
        assert_eq!(outcome.regressions[0].y, "scientific_articles_per_gdp");
        assert_eq!(outcome.correlations.columns.len(), 7);
        assert!(outcome.figures.is_empty());
        assert!(outcome.folders.fig().unwrap().is_dir());

        let stored = read_table(&outcome.result_file).unwrap();
        assert_eq!(stored.columns(), outcome.table.columns());
        assert_eq!(stored.index(), outcome.table.index());
    }

    #[tokio::test]
    async fn test_run_saves_figures() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.save_figures = true;
        config.all_pairs = true;
        config.collision_policy = CollisionPolicy::Fail;

        let outcome = run(&config, &source()).await.unwrap();

        // correlation matrix plus one plot per column pair (7 choose 2)
        assert_eq!(outcome.figures.len(), 1 + 21);
        assert_eq!(outcome.regressions.len(), 21);
        let fig_dir = dir.path().join("fig");
        assert!(fig_dir
            .join("Pairwise_correlations_of_scientific_outcome.png")
            .exists());
        assert!(fig_dir
            .join("Linear_relationfor_rd_expend_per_gdp_vs_scientific_articles_per_gdp.png")
            .exists());
        for path in &outcome.figures {
            assert!(path.starts_with(&fig_dir));
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_custom_indicators_skip_derivations() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.indicators = science_indicators()[..2].to_vec();

        let outcome = run(&config, &source()).await.unwrap();
        assert_eq!(outcome.table.columns(), &["GDP", "population"]);
        assert!(outcome.regressions.is_empty());
        assert_eq!(outcome.dropped_rows, 0);
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&config(dir.path()), &FailingSource).await;
        assert!(matches!(result, Err(StudyError::ApiResponse { .. })));
        assert!(!dir.path().join("data").join("research_outcome.csv").exists());
    }
}
