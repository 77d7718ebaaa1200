use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Sentence vector from token states: the average of the positions whose
/// mask is non-zero, scaled to unit length.
///
/// `hidden` is `[batch, tokens, dim]`, `attention_mask` is `[batch, tokens]`
/// (any numeric dtype); the result is `[batch, dim]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, dim) = hidden.dims3()?;
    ensure!(attention_mask.dims() == [batch, tokens], "mask {:?} does not fit hidden states {:?}", attention_mask.dims(), hidden.dims());

    let weights = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&weights.unsqueeze(2)?)?.sum(1)?;
    let counts = weights.sum_keepdim(1)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps = if hidden.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = (mean.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    let pooled = mean.broadcast_div(&norms)?;
    ensure!(pooled.dims() == [batch, dim], "pooled shape {:?}, expected [{batch}, {dim}]", pooled.dims());
    Ok(pooled)
}
