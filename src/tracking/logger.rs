use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::error::{Result, ValError};

/// Column order of the per-epoch validation log.
pub const EPOCH_LOG_HEADER: [&str; 8] =
    ["epoch", "loss", "acc", "precision", "recall", "f1", "auc", "threshold"];

/// One row of the per-epoch validation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f64,
    pub acc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the epoch saw a single class.
    pub auc: Option<f64>,
    pub threshold: f64,
}

pub trait MetricsLogger {
    fn log(&mut self, record: &EpochRecord) -> Result<()>;
}

/// Tab-separated log: a header row, then one row per `log` call with the
/// record's fields picked in header order.
pub struct TsvLogger<W: Write> {
    writer: W,
    header: Vec<String>,
}

impl TsvLogger<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>, header: &[&str]) -> Result<Self> {
        TsvLogger::new(BufWriter::new(File::create(path)?), header)
    }
}

impl<W: Write> TsvLogger<W> {
    pub fn new(mut writer: W, header: &[&str]) -> Result<Self> {
        writeln!(writer, "{}", header.join("\t"))?;
        writer.flush()?;
        Ok(TsvLogger {
            writer,
            header: header.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsLogger for TsvLogger<W> {
    fn log(&mut self, record: &EpochRecord) -> Result<()> {
        let Value::Object(fields) = serde_json::to_value(record)? else {
            return Err(ValError::Parse("epoch record is not an object".into()));
        };
        let cells = self.header.iter()
            .map(|col| match fields.get(col) {
                Some(Value::Null) => Ok("nan".to_string()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(v) => Ok(v.to_string()),
                None => Err(ValError::MissingColumn(col.clone())),
            })
            .collect::<Result<Vec<_>>>()?;
        writeln!(self.writer, "{}", cells.join("\t"))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(auc: Option<f64>) -> EpochRecord {
        EpochRecord {
            epoch: 3,
            loss: 0.25,
            acc: 0.5,
            precision: 1.0,
            recall: 0.75,
            f1: 0.5,
            auc,
            threshold: 0.125,
        }
    }

    #[test]
    fn test_rows_follow_header_order() {
        let mut logger = TsvLogger::new(Vec::new(), &["epoch", "auc", "loss"]).unwrap();
        logger.log(&record(Some(0.875))).unwrap();
        logger.log(&record(None)).unwrap();
        let text = String::from_utf8(logger.into_inner()).unwrap();
        assert_eq!(text, "epoch\tauc\tloss\n3\t0.875\t0.25\n3\tnan\t0.25\n");
    }

    #[test]
    fn test_unknown_column() {
        let mut logger = TsvLogger::new(Vec::new(), &["epoch", "lr"]).unwrap();
        assert!(matches!(
            logger.log(&record(None)),
            Err(ValError::MissingColumn(c)) if c == "lr"
        ));
    }

    #[test]
    fn test_create_writes_full_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("val.log");
        let mut logger = TsvLogger::create(&path, &EPOCH_LOG_HEADER).unwrap();
        logger.log(&record(Some(1.0))).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("epoch\tloss\tacc\tprecision\trecall\tf1\tauc\tthreshold"));
        assert_eq!(lines.next(), Some("3\t0.25\t0.5\t1.0\t0.75\t0.5\t1.0\t0.125"));
    }
}
