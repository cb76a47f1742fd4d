// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// unitmaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! File descriptor helpers.

use nix::errno::Errno;
use std::os::unix::io::RawFd;

/// Close a file descriptor, tolerating it being gone already.
pub fn close(fd: RawFd) {
    if fd < 0 {
        return;
    }
    if let Err(e) = nix::unistd::close(fd) {
        if e != Errno::EBADF {
            log::warn!("Failed to close fd {}: {}", fd, e);
        }
    }
}

/// Set or clear the close-on-exec flag.
pub fn fd_cloexec(fd: RawFd, cloexec: bool) -> Result<(), Errno> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(Errno::last());
    }
    let new_flags = if cloexec {
        flags | libc::FD_CLOEXEC
    } else {
        flags & !libc::FD_CLOEXEC
    };
    if new_flags != flags && unsafe { libc::fcntl(fd, libc::F_SETFD, new_flags) } < 0 {
        return Err(Errno::last());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_cloexec() {
        let fd = nix::unistd::dup(0).unwrap();
        fd_cloexec(fd, true).unwrap();
        fd_cloexec(fd, false).unwrap();
        close(fd);
    }
}
