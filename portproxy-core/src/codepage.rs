//! Decoding of console program output
//!
//! netsh writes in the console's OEM code page (CP932 on Japanese Windows), not UTF-8.

/// Decode captured output the way the console would display it
#[cfg(windows)]
pub fn decode_output(bytes: &[u8]) -> String {
    // SAFETY: GetOEMCP takes no arguments and only reads process state.
    let code_page = unsafe { winapi::um::winnls::GetOEMCP() };
    decode_code_page(bytes, code_page)
}

/// Decode captured output as UTF-8, replacing invalid sequences
#[cfg(not(windows))]
pub fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode `bytes` from a Windows code page, falling back to lossy UTF-8 on failure
#[cfg(windows)]
pub fn decode_code_page(bytes: &[u8], code_page: u32) -> String {
    use std::ptr;
    use winapi::um::stringapiset::MultiByteToWideChar;

    if bytes.is_empty() {
        return String::new();
    }
    let fallback = || String::from_utf8_lossy(bytes).into_owned();
    let Ok(len) = i32::try_from(bytes.len()) else {
        return fallback();
    };

    // SAFETY: the input pointer/length come from a live slice, and the second call
    // writes at most `needed` UTF-16 units into a buffer of exactly that size.
    unsafe {
        let input = bytes.as_ptr() as *const i8;
        let needed = MultiByteToWideChar(code_page, 0, input, len, ptr::null_mut(), 0);
        if needed <= 0 {
            tracing::debug!("MultiByteToWideChar({}) sizing failed", code_page);
            return fallback();
        }

        let mut wide = vec![0u16; needed as usize];
        let written = MultiByteToWideChar(code_page, 0, input, len, wide.as_mut_ptr(), needed);
        if written <= 0 {
            return fallback();
        }
        String::from_utf16_lossy(&wide[..written as usize])
    }
}
