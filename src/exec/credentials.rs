//! Acting-user lookup for privilege drop.

use super::ExecError;

/// Numeric identity a child process is switched to before exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
}

/// Resolve a user name (or a numeric uid) through the passwd database.
#[cfg(unix)]
pub fn lookup(user: &str) -> Result<Credentials, ExecError> {
    use std::ffi::CString;
    use std::io;
    use std::mem::MaybeUninit;
    use std::ptr;

    let name = CString::new(user).map_err(|_| ExecError::UnknownUser(user.to_string()))?;

    let mut buf_len = match unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) } {
        n if n > 0 => n as usize,
        _ => 1024,
    };

    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut buf = vec![0 as libc::c_char; buf_len];
        let mut found: *mut libc::passwd = ptr::null_mut();

        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut found,
            )
        };

        if rc == libc::ERANGE && buf_len < 1 << 20 {
            buf_len *= 2;
            continue;
        }
        if rc != 0 {
            return Err(ExecError::UserLookup {
                user: user.to_string(),
                source: io::Error::from_raw_os_error(rc),
            });
        }
        if found.is_null() {
            // Accept a bare uid for accounts without a passwd entry name.
            return match user.parse::<u32>() {
                Ok(uid) => lookup_uid(uid).ok_or_else(|| ExecError::UnknownUser(user.to_string())),
                Err(_) => Err(ExecError::UnknownUser(user.to_string())),
            };
        }

        let pwd = unsafe { pwd.assume_init() };
        return Ok(Credentials {
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
        });
    }
}

#[cfg(unix)]
fn lookup_uid(uid: u32) -> Option<Credentials> {
    unsafe {
        let pwd = libc::getpwuid(uid);
        if pwd.is_null() {
            return None;
        }
        Some(Credentials {
            uid: (*pwd).pw_uid,
            gid: (*pwd).pw_gid,
        })
    }
}

#[cfg(not(unix))]
pub fn lookup(_user: &str) -> Result<Credentials, ExecError> {
    Err(ExecError::UserUnsupported)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_zero() {
        let creds = lookup("root").unwrap();
        assert_eq!(creds.uid, 0);
        assert_eq!(creds.gid, 0);
    }

    #[test]
    fn numeric_uid_resolves() {
        assert_eq!(lookup("0").unwrap().uid, 0);
    }

    #[test]
    fn missing_user_is_distinct_error() {
        let err = lookup("no-such-user-kube-test").unwrap_err();
        assert!(matches!(err, ExecError::UnknownUser(ref u) if u == "no-such-user-kube-test"));
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(matches!(lookup("ro\0ot"), Err(ExecError::UnknownUser(_))));
    }
}
