//! Whether the current process runs with administrator rights
//!
//! Only used to warn the operator; netsh itself rejects unprivileged changes.

/// Query the elevation state of the current process token
///
/// Any failure to read the token counts as not elevated.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use std::mem;
    use std::ptr;
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
    use winapi::um::securitybaseapi::GetTokenInformation;
    use winapi::um::winnt::{TokenElevation, HANDLE, TOKEN_ELEVATION, TOKEN_QUERY};

    // SAFETY: the token handle is only used while open and closed before returning;
    // GetTokenInformation writes at most size_of::<TOKEN_ELEVATION>() bytes.
    unsafe {
        let mut token: HANDLE = ptr::null_mut();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
            tracing::warn!("OpenProcessToken failed: {}", GetLastError());
            return false;
        }

        let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
        let mut returned: u32 = 0;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            &mut elevation as *mut _ as *mut _,
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        let error = GetLastError();
        CloseHandle(token);

        if ok == 0 {
            tracing::warn!("GetTokenInformation failed: {}", error);
            return false;
        }

        elevation.TokenIsElevated != 0
    }
}

/// The port proxy table only exists on Windows; elsewhere nothing is elevated
#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    false
}
