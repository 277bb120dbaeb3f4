use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Encode one text as `[1, T]` input ids and attention mask, truncated to `max_len`.
/// A single sequence needs no padding, so the mask is all ones.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    if ids.is_empty() { return Err(anyhow!("Tokenizer produced no tokens")); }
    let len = ids.len();
    let input_ids = Tensor::from_vec(ids, (1, len), device)?;
    let attention_mask = Tensor::from_vec(mask, (1, len), device)?;
    Ok((input_ids, attention_mask))
}
