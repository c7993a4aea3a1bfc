//! Collapse AnnotSV CNV rows into one row per gene.

pub mod collapser;
pub mod cytoband;
pub mod diagnostics;
pub mod group;
pub mod input;
pub mod merge;
pub mod output;
pub mod policy;
pub mod schema;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use regex::Regex;
use thousands::Separable;

use crate::{common::open_write_maybe_gz, err::InputError};

use self::{
    collapser::collapse_table,
    cytoband::CytobandResolver,
    diagnostics::{write_diagnostics, write_error, write_header},
    input::load_annotation_table,
    output::CollapsedTableWriter,
    policy::CollapsePlan,
};

/// Command line arguments for `strucvars collapse` sub command.
#[derive(Parser, Debug)]
#[command(about = "Collapse AnnotSV CNV rows into one row per gene", long_about = None)]
pub struct Args {
    /// Path to the AnnotSV TSV file with multiple rows per gene.
    #[arg(long)]
    pub path_input: String,
    /// Path to the UCSC `cytoBand.txt` file.
    #[arg(long)]
    pub path_cytobands: String,
    /// Directory to write the output table and the log file to.
    #[arg(long)]
    pub path_output_dir: String,
    /// Path to the output TSV file, defaults to `<output dir>/<batch>_cnv.txt`.
    #[arg(long)]
    pub path_output: Option<String>,
    /// Batch identifier, extracted from the input file name if not given.
    #[arg(long)]
    pub batch_id: Option<String>,
    /// Regular expression for extracting the batch identifier from the
    /// input file name.
    #[arg(long, default_value = r"P\d{7}")]
    pub batch_id_pattern: String,
    /// Optional number of threads to use.
    #[arg(long)]
    pub num_threads: Option<usize>,
}

/// Configuration of one collapse run, resolved from `Args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseConfig {
    pub batch_id: String,
    pub path_input: PathBuf,
    pub path_cytobands: PathBuf,
    pub path_output: PathBuf,
    pub path_log: PathBuf,
}

impl CollapseConfig {
    /// Resolve paths and the batch identifier.
    pub fn from_args(args: &Args) -> Result<Self, anyhow::Error> {
        let expand = |path: &str| PathBuf::from(shellexpand::tilde(path).into_owned());
        let path_input = expand(&args.path_input);
        let output_dir = expand(&args.path_output_dir);

        let batch_id = match &args.batch_id {
            Some(batch_id) => batch_id.clone(),
            None => {
                let pattern = Regex::new(&args.batch_id_pattern).map_err(|e| {
                    anyhow::anyhow!("invalid batch ID pattern {:?}: {}", &args.batch_id_pattern, e)
                })?;
                batch_id_from_path(&path_input, &pattern)?
            }
        };

        Ok(Self {
            path_output: args
                .path_output
                .as_deref()
                .map(expand)
                .unwrap_or_else(|| output_dir.join(format!("{}_cnv.txt", &batch_id))),
            path_log: output_dir.join(format!("cnv_{}_log.txt", &batch_id)),
            path_cytobands: expand(&args.path_cytobands),
            path_input,
            batch_id,
        })
    }
}

/// Extract the batch identifier from the file name of `path`.
pub fn batch_id_from_path(path: &Path, pattern: &Regex) -> Result<String, InputError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    pattern
        .find(&name)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| InputError::NoBatchId(name))
}

/// Perform the collapsing as configured in `config`.
///
/// The diagnostics log is written in any case; if the run fails, its last
/// line names the error.
pub fn collapse(config: &CollapseConfig) -> Result<(), anyhow::Error> {
    let started = chrono::Local::now();
    tracing::info!("Analysis started: {}", &config.batch_id);

    let mut log = open_write_maybe_gz(&config.path_log)?;
    write_header(&mut log, &config.batch_id, started)?;
    let result = collapse_with_log(config, &mut log);
    if let Err(err) = &result {
        write_error(&mut log, err)?;
    }
    log.flush()?;

    result
}

/// Load, collapse and write out, recording diagnostics to `log`.
fn collapse_with_log<W: Write>(
    config: &CollapseConfig,
    log: &mut W,
) -> Result<(), anyhow::Error> {
    let cytobands = CytobandResolver::from_path(&config.path_cytobands)?;
    tracing::info!(
        "loaded {} cytobands",
        cytobands.len().separate_with_commas()
    );

    let table = load_annotation_table(&config.path_input, &config.batch_id)?;
    let plan = CollapsePlan::new(&table.header)?;
    tracing::info!("loaded {} rows", table.rows.len().separate_with_commas());

    let collapsed = match collapse_table(&table, &plan, &cytobands, &config.batch_id) {
        Ok(collapsed) => collapsed,
        Err(failure) => {
            write_diagnostics(log, &failure.diagnostics)?;
            return Err(failure.error.into());
        }
    };
    write_diagnostics(log, &collapsed.diagnostics)?;
    tracing::info!(
        "collapsed into {} rows, {} diagnostics",
        collapsed.rows.len().separate_with_commas(),
        collapsed.diagnostics.len().separate_with_commas()
    );

    let out = open_write_maybe_gz(&config.path_output)?;
    let mut writer = CollapsedTableWriter::new(out, &table.header)?;
    for row in &collapsed.rows {
        writer.write_row(row)?;
    }
    tracing::info!(
        "{:?} successfully written ({} rows)",
        &config.path_output,
        writer.count().separate_with_commas()
    );
    writer.finish()?.flush()?;

    Ok(())
}

/// Main entry point for the `strucvars collapse` command.
pub fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("Starting `strucvars collapse`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    if let Some(num_threads) = args.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| anyhow::anyhow!("building global Rayon thread pool failed: {}", e))?;
    }

    let config = CollapseConfig::from_args(args)?;
    tracing::debug!("config = {:#?}", &config);
    collapse(&config)?;

    tracing::info!(
        "All of `strucvars collapse` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use regex::Regex;
    use temp_testdir::TempDir;

    use super::{batch_id_from_path, run, Args, CollapseConfig};
    use crate::common::Args as CommonArgs;

    fn args(tmp_dir: &TempDir, path_input: &str) -> Args {
        Args {
            path_input: path_input.to_string(),
            path_cytobands: "tests/strucvars/collapse/cytoBand.txt".to_string(),
            path_output_dir: tmp_dir.to_string_lossy().into_owned(),
            path_output: None,
            batch_id: None,
            batch_id_pattern: r"P\d{7}".to_string(),
            num_threads: None,
        }
    }

    #[rstest::rstest]
    #[case("data/P0001234.candidate.tsv", Some("P0001234"))]
    #[case("P0001234/P7654321_annotsv.tsv", Some("P7654321"))]
    #[case("data/sample.tsv", None)]
    fn batch_id_from_file_name(#[case] path: &str, #[case] expected: Option<&str>) {
        let pattern = Regex::new(r"P\d{7}").unwrap();
        let actual = batch_id_from_path(Path::new(path), &pattern).ok();
        assert_eq!(expected.map(str::to_string), actual);
    }

    #[test]
    fn config_from_args() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let config = CollapseConfig::from_args(&args(
            &tmp_dir,
            "tests/strucvars/collapse/P0000001.annotsv.tsv",
        ))?;

        assert_eq!("P0000001", config.batch_id);
        assert_eq!(tmp_dir.join("P0000001_cnv.txt"), config.path_output);
        assert_eq!(tmp_dir.join("cnv_P0000001_log.txt"), config.path_log);

        Ok(())
    }

    #[test]
    fn config_explicit_batch_id_and_output() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let mut args = args(&tmp_dir, "tests/strucvars/collapse/input.tsv");
        args.batch_id = Some("BATCH1".to_string());
        args.path_output = Some(tmp_dir.join("out.tsv.gz").to_string_lossy().into_owned());
        let config = CollapseConfig::from_args(&args)?;

        assert_eq!("BATCH1", config.batch_id);
        assert_eq!(tmp_dir.join("out.tsv.gz"), config.path_output);
        assert_eq!(tmp_dir.join("cnv_BATCH1_log.txt"), config.path_log);

        Ok(())
    }

    #[test]
    fn config_without_batch_id_fails() {
        let tmp_dir = TempDir::default();
        let args = args(&tmp_dir, "tests/strucvars/collapse/input.tsv");
        assert!(CollapseConfig::from_args(&args).is_err());
    }

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let args = args(&tmp_dir, "tests/strucvars/collapse/P0000001.annotsv.tsv");

        run(&CommonArgs::default(), &args)?;

        let output = std::fs::read_to_string(tmp_dir.join("P0000001_cnv.txt"))?;
        let lines = output.lines().collect::<Vec<_>>();
        let header = lines[0].split('\t').collect::<Vec<_>>();
        assert_eq!(
            vec!["Phenotips ID", "MergeCount", "CytoBand", "AnnotSV ID"],
            header[..4].to_vec()
        );
        assert!(header.contains(&"#hom"));
        assert!(header.contains(&"#htz"));
        assert_eq!(4, lines.len());

        let col = |name: &str| header.iter().position(|h| *h == name).unwrap();
        let rows = lines[1..]
            .iter()
            .map(|line| line.split('\t').collect::<Vec<_>>())
            .collect::<Vec<_>>();

        // SHANK3 has DEL and DUP rows and is skipped.
        let genes = rows
            .iter()
            .map(|row| row[col("Gene name")])
            .collect::<Vec<_>>();
        assert_eq!(vec!["SKI", "PRKCZ", "TERT"], genes);

        let ski = &rows[0];
        assert_eq!("P0000001", ski[col("Phenotips ID")]);
        assert_eq!("2", ski[col("MergeCount")]);
        assert_eq!("chr1p36.33", ski[col("CytoBand")]);
        assert_eq!("1_2160000_2241000_DEL", ski[col("AnnotSV ID")]);
        assert_eq!("-81000", ski[col("SV length")]);
        assert_eq!("exon1-txEnd", ski[col("location")]);
        assert_eq!("nssv1, nssv2, nssv3", ski[col("DGV_LOSS_IDs")]);
        assert_eq!("0.0005", ski[col("DGV_LOSS_Frequency")]);
        assert_eq!("gnomAD_DEL_1, gnomAD_DEL_2", ski[col("GD_ID")]);
        assert_eq!("100, 200", ski[col("GD_AN")]);
        assert_eq!("", ski[col("GD_AF")]);
        assert_eq!("0.95", ski[col("pLI_ExAC")]);
        assert_eq!("1, 2", ski[col("#hom")]);
        assert_eq!("", ski[col("NM")]);

        let prkcz = &rows[1];
        assert_eq!("1", prkcz[col("MergeCount")]);
        assert_eq!("1_2300000_2400000_DUP", prkcz[col("AnnotSV ID")]);
        assert_eq!("chr1p36.32", prkcz[col("CytoBand")]);

        let tert = &rows[2];
        assert_eq!("unk", tert[col("CytoBand")]);
        assert_eq!("", tert[col("Dist_nearest_SS")]);

        let log = std::fs::read_to_string(tmp_dir.join("cnv_P0000001_log.txt"))?;
        let log_lines = log.lines().collect::<Vec<_>>();
        assert_eq!(3, log_lines.len());
        assert!(log_lines[0].starts_with("************ cnv_collapse error log: P0000001"));
        assert_eq!(
            "Error: DEL and DUP in gene SHANK3... not including in output file.",
            log_lines[1]
        );
        assert!(log_lines[2].contains("gene TERT not found in cytoband data"));

        Ok(())
    }

    #[test]
    fn run_missing_column_fails_before_output() {
        let tmp_dir = TempDir::default();
        let mut args = args(&tmp_dir, "tests/strucvars/collapse/missing_column.tsv");
        args.batch_id = Some("P0000001".to_string());

        let err = run(&CommonArgs::default(), &args).unwrap_err();
        assert!(err.to_string().contains("GD_AF"), "{}", err);
        assert!(!tmp_dir.join("P0000001_cnv.txt").exists());

        let log = std::fs::read_to_string(tmp_dir.join("cnv_P0000001_log.txt")).unwrap();
        let log_lines = log.lines().collect::<Vec<_>>();
        assert_eq!(2, log_lines.len());
        assert_eq!("Error: missing required column(s): GD_AF", log_lines[1]);
    }

    #[test]
    fn run_malformed_number_keeps_log() -> Result<(), anyhow::Error> {
        let tmp_dir = TempDir::default();
        let input = std::fs::read_to_string("tests/strucvars/collapse/P0000001.annotsv.tsv")?;
        let mut lines = input.lines().map(str::to_string).collect::<Vec<_>>();
        let freq = lines[0]
            .split('\t')
            .position(|name| name == "DGV_LOSS_Frequency")
            .unwrap();
        // Corrupt the first PRKCZ row, after the skipped SHANK3 group.
        let mut cells = lines[5].split('\t').map(str::to_string).collect::<Vec<_>>();
        assert_eq!("PRKCZ", cells[lines[0].split('\t').position(|n| n == "Gene name").unwrap()]);
        cells[freq] = "abc".to_string();
        lines[5] = cells.join("\t");
        let path_input = tmp_dir.join("P0000001.annotsv.tsv");
        std::fs::write(&path_input, lines.join("\n") + "\n")?;

        let err = run(
            &CommonArgs::default(),
            &args(&tmp_dir, &path_input.to_string_lossy()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"abc\""), "{}", err);
        assert!(!tmp_dir.join("P0000001_cnv.txt").exists());

        let log = std::fs::read_to_string(tmp_dir.join("cnv_P0000001_log.txt"))?;
        let log_lines = log.lines().collect::<Vec<_>>();
        assert_eq!(3, log_lines.len());
        assert!(log_lines[0].starts_with("************ cnv_collapse error log: P0000001"));
        assert_eq!(
            "Error: DEL and DUP in gene SHANK3... not including in output file.",
            log_lines[1]
        );
        assert!(
            log_lines[2].starts_with(
                "Error: collapsing gene \"PRKCZ\", field \"DGV_LOSS_Frequency\": \
                 invalid numeric token \"abc\""
            ),
            "{}",
            log_lines[2]
        );

        Ok(())
    }
}
