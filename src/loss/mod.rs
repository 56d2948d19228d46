pub mod bce;
pub mod bce_logits;
pub mod loss_type;

pub use bce::BceLoss;
pub use bce_logits::BceWithLogitsLoss;
pub use loss_type::LossType;
