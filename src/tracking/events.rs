use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Deserialize};

use crate::error::{Result, ValError};
use crate::math::matrix::Matrix;

/// Sink for experiment-tracking events keyed by tag and step.
pub trait EventWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    /// Records one embedding row per sample with a matching metadata label.
    fn add_embedding(&mut self, embeddings: &Matrix, metadata: &[f64], step: usize, tag: &str) -> Result<()>;
}

/// One line of `scalars.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEvent {
    pub tag: String,
    pub value: f64,
    pub step: usize,
    pub wall_time: f64,
}

/// Writes scalars as JSON lines and embeddings in the TensorBoard
/// projector layout under a run directory.
pub struct FileEventWriter {
    dir: PathBuf,
    scalars: BufWriter<File>,
}

impl FileEventWriter {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let scalars = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("scalars.jsonl"))?;
        Ok(FileEventWriter { dir, scalars: BufWriter::new(scalars) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn wall_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

impl EventWriter for FileEventWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        let event = ScalarEvent { tag: tag.to_string(), value, step, wall_time: wall_time() };
        serde_json::to_writer(&mut self.scalars, &event)?;
        self.scalars.write_all(b"\n")?;
        self.scalars.flush()?;
        Ok(())
    }

    fn add_embedding(&mut self, embeddings: &Matrix, metadata: &[f64], step: usize, tag: &str) -> Result<()> {
        if metadata.len() != embeddings.rows {
            return Err(ValError::shape(
                format!("{} metadata rows", embeddings.rows),
                format!("{} metadata rows", metadata.len()),
            ));
        }

        let subdir = format!("{:05}/{}", step, tag.replace('/', "_"));
        let target = self.dir.join(&subdir);
        fs::create_dir_all(&target)?;

        let mut tensors = BufWriter::new(File::create(target.join("tensors.tsv"))?);
        for row in &embeddings.data {
            let line: Vec<String> = row.iter().map(|x| x.to_string()).collect();
            writeln!(tensors, "{}", line.join("\t"))?;
        }
        tensors.flush()?;

        let mut labels = BufWriter::new(File::create(target.join("metadata.tsv"))?);
        for label in metadata {
            writeln!(labels, "{label}")?;
        }
        labels.flush()?;

        let mut config = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("projector_config.pbtxt"))?;
        write!(
            config,
            "embeddings {{\n  tensor_name: \"{tag}:{step:05}\"\n  tensor_path: \"{subdir}/tensors.tsv\"\n  metadata_path: \"{subdir}/metadata.tsv\"\n}}\n",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalars_are_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = FileEventWriter::create(dir.path()).unwrap();
        w.add_scalar("val/loss", 0.5, 1).unwrap();
        w.add_scalar("val/acc", 0.75, 1).unwrap();

        let text = fs::read_to_string(dir.path().join("scalars.jsonl")).unwrap();
        let events: Vec<ScalarEvent> = text.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].tag, "val/acc");
        assert_eq!(events[1].value, 0.75);
        assert_eq!(events[0].step, 1);
    }

    #[test]
    fn test_embedding_projector_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = FileEventWriter::create(dir.path()).unwrap();
        let emb = Matrix::from_data(vec![vec![0.5, 1.0], vec![-2.0, 0.0]]).unwrap();
        w.add_embedding(&emb, &[1.0, 0.0], 10, "val/latent space").unwrap();

        let base = dir.path().join("00010").join("val_latent space");
        assert_eq!(fs::read_to_string(base.join("tensors.tsv")).unwrap(), "0.5\t1\n-2\t0\n");
        assert_eq!(fs::read_to_string(base.join("metadata.tsv")).unwrap(), "1\n0\n");
        let config = fs::read_to_string(dir.path().join("projector_config.pbtxt")).unwrap();
        assert!(config.contains("tensor_name: \"val/latent space:00010\""));
        assert!(config.contains("tensor_path: \"00010/val_latent space/tensors.tsv\""));
    }

    #[test]
    fn test_embedding_metadata_must_match_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = FileEventWriter::create(dir.path()).unwrap();
        let emb = Matrix::zeros(3, 2);
        assert!(w.add_embedding(&emb, &[1.0], 0, "val/latent space").is_err());
    }
}
