use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Encodes `text` into fixed-width `[1, max_len]` id and mask tensors.
/// Long inputs are cut at `max_len`; short ones are filled with `pad_id`
/// and a zero mask.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let encoding = tokenizer.encode(text, true).map_err(|e| anyhow!("cannot tokenize input: {e}"))?;
    let kept = encoding.get_ids().len().min(max_len);
    let mut ids = vec![pad_id; max_len];
    let mut mask = vec![0u32; max_len];
    ids[..kept].copy_from_slice(&encoding.get_ids()[..kept]);
    mask[..kept].copy_from_slice(&encoding.get_attention_mask()[..kept]);
    Ok((Tensor::from_vec(ids, (1, max_len), device)?, Tensor::from_vec(mask, (1, max_len), device)?))
}
