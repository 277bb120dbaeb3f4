use anyhow::{Result, anyhow};
use candle_core::{DType, Tensor};

/// Mean of the unmasked token states of `hidden` (`[B, T, H]`), L2-normalized
/// per row. The mask may be any numeric dtype; it is cast to the hidden dtype.
pub fn mean_pool_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _time, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_broadcast = mask.unsqueeze(2)?.broadcast_as(hidden.shape())?;
    let summed = (hidden * &mask_broadcast)?.sum(1)?;
    let lengths = mask.sum_keepdim(1)?;
    let mean = summed.broadcast_div(&lengths)?;
    let eps_val = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6f64, _ => 1e-12f64 };
    let norm = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps_val)?;
    let out = mean.broadcast_div(&norm)?;
    if out.dims() != [batch, hidden_dim] {
        return Err(anyhow!("pooled shape {:?}, expected [{batch}, {hidden_dim}]", out.dims()));
    }
    Ok(out)
}
