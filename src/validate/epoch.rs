use std::sync::mpsc::Sender;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::activation::activation::sigmoid;
use crate::data::loader::DataLoader;
use crate::distributed::{Collective, ReduceOp};
use crate::error::{Result, ValError};
use crate::math::matrix::Matrix;
use crate::metrics::{accuracy_binary, precision_recall_binary, roc_auc, AverageMeter, ThresholdMetrics};
use crate::network::model::Model;
use crate::tracking::EventWriter;
use crate::validate::config::{Sinks, ValidationConfig};
use crate::validate::report::{BatchProgress, ValidationReport};

/// Tag of the latent-space snapshot.
pub const LATENT_TAG: &str = "val/latent space";

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Runs one validation pass over `data_loader` and returns its report.
///
/// # Arguments
/// - `epoch`         : epoch number; used as the step for every emitted event
/// - `data_loader`   : the validation batches
/// - `subset_loader` : rows whose latent representation is captured on
///                     embedding epochs
/// - `model`         : evaluated through `&self` only
/// - `config`        : criterion, thresholds and embedding schedule
/// - `collective`    : when set, the running loss/accuracy totals are summed
///                     across workers before reporting
/// - `sinks`         : optional logger, event writer and progress channel
///
/// Corpus metrics (loss, precision/recall/F1 at the best-F1 threshold, AUC,
/// accuracy at that threshold) are computed over this worker's predictions.
/// `report.loss` is the corpus-level loss.
///
/// With a `collective`, a worker whose local pass fails still joins the
/// reduction and then returns its own error; its peers get
/// [`ValError::Collective`] instead of waiting on it.
pub fn val_epoch<M: Model + ?Sized>(
    epoch: usize,
    data_loader: &DataLoader,
    subset_loader: Option<&DataLoader>,
    model: &M,
    config: &ValidationConfig,
    collective: Option<&dyn Collective>,
    sinks: Sinks<'_>,
) -> Result<ValidationReport> {
    let t_start = Instant::now();
    let Sinks { logger, events, progress_tx } = sinks;

    let local = run_local_pass(epoch, data_loader, model, config, progress_tx);
    let (pass, world_size) = match collective {
        Some(group) => (reduce_running_stats(group, local)?, group.world_size()),
        None => (local?, 1),
    };

    let report = ValidationReport {
        epoch,
        loss: pass.loss,
        acc: pass.acc,
        precision: pass.best.precision,
        recall: pass.best.recall,
        f1: pass.best.f1,
        auc: pass.auc,
        threshold: pass.best.threshold,
        mean_batch_loss: pass.losses.avg,
        mean_batch_acc: pass.accuracies.avg,
        samples: pass.samples,
        batches: pass.batches,
        world_size,
        elapsed_ms: u64::try_from(t_start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    // ── Sinks ──────────────────────────────────────────────────────────────
    if let Some(logger) = logger {
        logger.log(&report.to_record())?;
    }

    if let Some(events) = events {
        write_scalars(events, &report)?;
        if config.embedding_due(epoch) {
            match subset_loader {
                Some(subset) => write_latent_space(events, subset, model, config, epoch)?,
                None => debug!(epoch, "no subset loader; latent space skipped"),
            }
        }
    }

    info!(
        epoch,
        loss = report.loss,
        acc = report.acc,
        f1 = report.f1,
        threshold = report.threshold,
        "validation finished"
    );

    Ok(report)
}

/// What one worker computes before the cross-worker reduction.
struct LocalPass {
    losses: AverageMeter,
    accuracies: AverageMeter,
    best: ThresholdMetrics,
    auc: Option<f64>,
    acc: f64,
    loss: f64,
    samples: usize,
    batches: usize,
}

fn run_local_pass<M: Model + ?Sized>(
    epoch: usize,
    data_loader: &DataLoader,
    model: &M,
    config: &ValidationConfig,
    mut progress_tx: Option<Sender<BatchProgress>>,
) -> Result<LocalPass> {
    config.validate()?;
    if data_loader.is_empty() {
        return Err(ValError::EmptyDataset);
    }
    info!("validation at epoch {}", epoch);

    let mut batch_time = AverageMeter::new();
    let mut data_time = AverageMeter::new();
    let mut losses = AverageMeter::new();
    let mut accuracies = AverageMeter::new();

    let n = data_loader.num_samples();
    let mut logits_all: Vec<f64> = Vec::with_capacity(n);
    let mut probs_all: Vec<f64> = Vec::with_capacity(n);
    let mut targets_all: Vec<f64> = Vec::with_capacity(n);

    let total_batches = data_loader.len();
    let mut end_time = Instant::now();

    // ── Inference over every batch ─────────────────────────────────────────
    for (i, batch) in data_loader.iter().enumerate() {
        data_time.update(end_time.elapsed().as_secs_f64(), 1);

        let logits = model.forward(&batch.inputs)?;
        if logits.len() != batch.len() {
            return Err(ValError::shape(
                format!("{} logits", batch.len()),
                format!("{} logits", logits.len()),
            ));
        }
        if let Some(k) = logits.iter().position(|x| !x.is_finite()) {
            return Err(ValError::NonFinite(format!(
                "logit {} in batch {} is {}",
                k, i + 1, logits[k]
            )));
        }
        let probs: Vec<f64> = logits.iter().map(|&x| sigmoid(x)).collect();
        let loss = config.loss.loss(&logits, &batch.targets)?;
        let acc = accuracy_binary(&probs, &batch.targets, config.batch_threshold, config.balanced);

        losses.update(loss, batch.len());
        accuracies.update(acc, batch.len());

        batch_time.update(end_time.elapsed().as_secs_f64(), 1);
        end_time = Instant::now();

        info!(
            "Epoch: [{}][{}/{}]\tTime {:.3} ({:.3})\tData {:.3} ({:.3})\tLoss {:.4} ({:.4})\tAcc {:.3} ({:.3})",
            epoch, i + 1, total_batches,
            batch_time.val, batch_time.avg,
            data_time.val, data_time.avg,
            losses.val, losses.avg,
            accuracies.val, accuracies.avg,
        );

        let progress = BatchProgress {
            epoch,
            batch: i + 1,
            total_batches,
            batch_time: batch_time.val,
            batch_time_avg: batch_time.avg,
            data_time: data_time.val,
            data_time_avg: data_time.avg,
            loss: losses.val,
            loss_avg: losses.avg,
            acc: accuracies.val,
            acc_avg: accuracies.avg,
        };
        let receiver_gone = progress_tx.as_ref().is_some_and(|tx| tx.send(progress).is_err());
        if receiver_gone {
            debug!("progress receiver dropped; continuing without progress messages");
            progress_tx = None;
        }

        logits_all.extend(logits);
        probs_all.extend(probs);
        targets_all.extend(batch.targets);
    }

    // ── Corpus-level metrics ───────────────────────────────────────────────
    let best = precision_recall_binary(&probs_all, &targets_all);
    let auc = roc_auc(&probs_all, &targets_all);
    if auc.is_none() {
        warn!(epoch, "AUC undefined: validation targets contain a single class");
    }
    let acc = accuracy_binary(&probs_all, &targets_all, best.threshold, config.balanced);
    let loss = config.loss.loss(&logits_all, &targets_all)?;

    Ok(LocalPass {
        losses,
        accuracies,
        best,
        auc,
        acc,
        loss,
        samples: targets_all.len(),
        batches: total_batches,
    })
}

/// Sums `[loss_sum, loss_count, acc_sum, acc_count, failed]` across workers.
/// A failed local pass still contributes, with `failed = 1`.
fn reduce_running_stats(group: &dyn Collective, local: Result<LocalPass>) -> Result<LocalPass> {
    let mut totals = match &local {
        Ok(pass) => [pass.losses.sum, pass.losses.count, pass.accuracies.sum, pass.accuracies.count, 0.0],
        Err(_) => [0.0, 0.0, 0.0, 0.0, 1.0],
    };
    let reduced = group.all_reduce(&mut totals, ReduceOp::Sum);

    let mut pass = local?;
    reduced?;
    if totals[4] > 0.0 {
        return Err(ValError::Collective(format!(
            "{} of {} workers failed before the reduction",
            totals[4], group.world_size()
        )));
    }
    pass.losses.set_totals(totals[0], totals[1]);
    pass.accuracies.set_totals(totals[2], totals[3]);
    debug!(rank = group.rank(), world_size = group.world_size(), "reduced running statistics");
    Ok(pass)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn write_scalars(events: &mut dyn EventWriter, report: &ValidationReport) -> Result<()> {
    let step = report.epoch;
    events.add_scalar("val/loss", report.loss, step)?;
    events.add_scalar("val/acc", report.acc, step)?;
    events.add_scalar("val/precision", report.precision, step)?;
    events.add_scalar("val/recall", report.recall, step)?;
    events.add_scalar("val/f1", report.f1, step)?;
    if let Some(auc) = report.auc {
        events.add_scalar("val/auc", auc, step)?;
    }
    events.add_scalar("val/threshold", report.threshold, step)
}

/// Captures the hooked layer's output over the whole subset and emits it
/// with the subset targets as labels.
fn write_latent_space<M: Model + ?Sized>(
    events: &mut dyn EventWriter,
    subset: &DataLoader,
    model: &M,
    config: &ValidationConfig,
    epoch: usize,
) -> Result<()> {
    if subset.is_empty() {
        debug!(epoch, "empty subset; latent space skipped");
        return Ok(());
    }
    let mut latents = Vec::with_capacity(subset.len());
    let mut labels = Vec::with_capacity(subset.num_samples());
    for batch in subset.iter() {
        latents.push(model.latent(&batch.inputs, &config.embedding_layer)?);
        labels.extend(batch.targets);
    }
    let latent_vectors = Matrix::concat_rows(latents)?;
    events.add_embedding(&latent_vectors, &labels, epoch, LATENT_TAG)
}
