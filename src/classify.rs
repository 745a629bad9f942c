// src/classify.rs
//! Response validity.
//!
//! The site serves its anti-automation challenge as ordinary, well-formed
//! HTML with a 200 status, so status and markup say nothing. Size does: a
//! challenge page is about 2 KB, a real month page 150-250 KB.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    SoftBlocked,
}

/// Anything shorter than `min_valid_size` bytes is a soft block.
pub fn classify(body: &[u8], min_valid_size: usize) -> Verdict {
    if body.len() < min_valid_size {
        Verdict::SoftBlocked
    } else {
        Verdict::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::consts::MIN_VALID_SIZE;

    #[test]
    fn threshold_boundaries() {
        let t = MIN_VALID_SIZE;
        assert_eq!(classify(&vec![b'x'; t - 1], t), Verdict::SoftBlocked);
        assert_eq!(classify(&vec![b'x'; t], t), Verdict::Valid);
        assert_eq!(classify(&vec![b'x'; t + 1], t), Verdict::Valid);
    }

    #[test]
    fn empty_body_is_blocked() {
        assert_eq!(classify(b"", 1), Verdict::SoftBlocked);
    }
}
