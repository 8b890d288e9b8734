use std::collections::BTreeMap;

use thiserror::Error;

pub const ARG_JOB_NAME: &str = "JOB_NAME";
pub const ARG_JOB_RUN_ID: &str = "JOB_RUN_ID";
pub const ARG_LANDING_BUCKET: &str = "landing_bucket";
pub const ARG_CURATED_BUCKET: &str = "curated_bucket";
pub const ARG_SOURCE_DATABASE: &str = "source_database";
pub const ARG_SOURCE_TABLE: &str = "source_table";
pub const ARG_OLD_COLUMN_NAME: &str = "old_column_name";
pub const ARG_NEW_COLUMN_NAME: &str = "new_column_name";

pub const REQUIRED_JOB_ARGUMENTS: [&str; 3] =
    [ARG_JOB_NAME, ARG_LANDING_BUCKET, ARG_CURATED_BUCKET];

pub const DEFAULT_SOURCE_DATABASE: &str = "your-database-name";
pub const DEFAULT_SOURCE_TABLE: &str = "your-table-name";
pub const DEFAULT_OLD_COLUMN_NAME: &str = "old_column_name";
pub const DEFAULT_NEW_COLUMN_NAME: &str = "new_column_name";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("missing required job argument --{0}")]
    Missing(String),
    #[error("job argument --{0} expects a value")]
    MissingValue(String),
    #[error("job argument --{0} cannot be empty")]
    Empty(String),
}

/// Named job arguments in the `--KEY value` / `--KEY=value` form the job
/// scheduler passes on the command line.
pub type ResolvedOptions = BTreeMap<String, String>;

/// Collects every `--KEY` option from `argv` and checks that each of
/// `required` is present.
///
/// Positional tokens are skipped and unknown keys are kept, since the
/// scheduler appends its own options (`--TempDir`, `--job-bookmark-option`,
/// ...) to every run. A repeated key keeps its last value.
pub fn resolve_options<I, S>(argv: I, required: &[&str]) -> Result<ResolvedOptions, ArgumentError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: Vec<String> = argv
        .into_iter()
        .map(|token| token.as_ref().to_string())
        .collect();

    let mut options = ResolvedOptions::new();
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;

        let Some(name) = token.strip_prefix("--") else {
            continue;
        };

        if let Some((key, value)) = name.split_once('=') {
            options.insert(key.to_string(), value.to_string());
            continue;
        }

        match tokens.get(index) {
            Some(value) if !value.starts_with("--") => {
                options.insert(name.to_string(), value.clone());
                index += 1;
            }
            _ => {
                if required.contains(&name) {
                    return Err(ArgumentError::MissingValue(name.to_string()));
                }
                options.insert(name.to_string(), String::new());
            }
        }
    }

    for key in required {
        match options.get(*key) {
            None => return Err(ArgumentError::Missing((*key).to_string())),
            Some(value) if value.trim().is_empty() => {
                return Err(ArgumentError::Empty((*key).to_string()))
            }
            Some(_) => {}
        }
    }

    Ok(options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArguments {
    pub job_name: String,
    pub job_run_id: Option<String>,
    pub landing_bucket: String,
    pub curated_bucket: String,
    pub source_database: String,
    pub source_table: String,
    pub old_column_name: String,
    pub new_column_name: String,
}

impl JobArguments {
    pub fn from_argv<I, S>(argv: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = resolve_options(argv, &REQUIRED_JOB_ARGUMENTS)?;
        Self::from_options(&options)
    }

    pub fn from_options(options: &ResolvedOptions) -> Result<Self, ArgumentError> {
        let required = |key: &str| -> Result<String, ArgumentError> {
            let value = options
                .get(key)
                .ok_or_else(|| ArgumentError::Missing(key.to_string()))?;
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ArgumentError::Empty(key.to_string()));
            }
            Ok(trimmed.to_string())
        };
        let optional = |key: &str, default: &str| -> String {
            options
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Ok(Self {
            job_name: required(ARG_JOB_NAME)?,
            job_run_id: options
                .get(ARG_JOB_RUN_ID)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            landing_bucket: required(ARG_LANDING_BUCKET)?,
            curated_bucket: required(ARG_CURATED_BUCKET)?,
            source_database: optional(ARG_SOURCE_DATABASE, DEFAULT_SOURCE_DATABASE),
            source_table: optional(ARG_SOURCE_TABLE, DEFAULT_SOURCE_TABLE),
            old_column_name: optional(ARG_OLD_COLUMN_NAME, DEFAULT_OLD_COLUMN_NAME),
            new_column_name: optional(ARG_NEW_COLUMN_NAME, DEFAULT_NEW_COLUMN_NAME),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_space_and_equals_separated_options() {
        let options = resolve_options(
            [
                "curate_job",
                "--JOB_NAME",
                "curate-events",
                "--landing_bucket=raw-bucket",
                "--curated_bucket",
                "curated-bucket",
            ],
            &REQUIRED_JOB_ARGUMENTS,
        )
        .expect("options should resolve");

        assert_eq!(options["JOB_NAME"], "curate-events");
        assert_eq!(options["landing_bucket"], "raw-bucket");
        assert_eq!(options["curated_bucket"], "curated-bucket");
    }

    #[test]
    fn keeps_unknown_scheduler_options() {
        let options = resolve_options(
            [
                "--JOB_NAME",
                "job",
                "--job-bookmark-option",
                "job-bookmark-disable",
                "--enable-metrics",
                "--landing_bucket",
                "l",
                "--curated_bucket",
                "c",
            ],
            &REQUIRED_JOB_ARGUMENTS,
        )
        .expect("options should resolve");

        assert_eq!(options["job-bookmark-option"], "job-bookmark-disable");
        assert_eq!(options["enable-metrics"], "");
    }

    #[test]
    fn reports_first_missing_required_argument() {
        let error = resolve_options(
            ["--JOB_NAME", "job", "--landing_bucket", "l"],
            &REQUIRED_JOB_ARGUMENTS,
        )
        .expect_err("curated bucket is missing");
        assert_eq!(error, ArgumentError::Missing("curated_bucket".to_string()));
        assert_eq!(
            error.to_string(),
            "missing required job argument --curated_bucket"
        );
    }

    #[test]
    fn rejects_required_argument_without_value() {
        let error = resolve_options(
            ["--JOB_NAME", "--landing_bucket", "l", "--curated_bucket", "c"],
            &REQUIRED_JOB_ARGUMENTS,
        )
        .expect_err("job name has no value");
        assert_eq!(error, ArgumentError::MissingValue("JOB_NAME".to_string()));
    }

    #[test]
    fn last_occurrence_wins() {
        let options = resolve_options(
            ["--JOB_NAME", "first", "--JOB_NAME", "second"],
            &[ARG_JOB_NAME],
        )
        .expect("options should resolve");
        assert_eq!(options["JOB_NAME"], "second");
    }

    #[test]
    fn job_arguments_apply_defaults_for_optional_keys() {
        let arguments = JobArguments::from_argv([
            "--JOB_NAME",
            "curate",
            "--landing_bucket",
            "landing",
            "--curated_bucket",
            "curated",
        ])
        .expect("arguments should parse");

        assert_eq!(arguments.job_run_id, None);
        assert_eq!(arguments.source_database, "your-database-name");
        assert_eq!(arguments.source_table, "your-table-name");
        assert_eq!(arguments.old_column_name, "old_column_name");
        assert_eq!(arguments.new_column_name, "new_column_name");
    }

    #[test]
    fn job_arguments_read_overrides() {
        let arguments = JobArguments::from_argv([
            "--JOB_NAME=curate",
            "--JOB_RUN_ID=jr_0001",
            "--landing_bucket=landing",
            "--curated_bucket=curated",
            "--source_database=events",
            "--source_table=clicks",
        ])
        .expect("arguments should parse");

        assert_eq!(arguments.job_run_id.as_deref(), Some("jr_0001"));
        assert_eq!(arguments.source_database, "events");
        assert_eq!(arguments.source_table, "clicks");
    }

    #[test]
    fn job_arguments_reject_blank_bucket() {
        let error = JobArguments::from_argv([
            "--JOB_NAME=curate",
            "--landing_bucket= ",
            "--curated_bucket=curated",
        ])
        .expect_err("blank bucket should fail");
        assert_eq!(error, ArgumentError::Empty("landing_bucket".to_string()));
    }
}
