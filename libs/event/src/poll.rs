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

use crate::Result;
use libc::{epoll_event, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL};
use std::cmp::max;
use std::os::unix::io::{AsRawFd, RawFd};
use std::ptr;

/// syscall
#[macro_export]
macro_rules! syscall {
    ($fn: ident ( $($arg: expr),* $(,)* ) ) => {{
        let res = unsafe { libc::$fn($($arg, )*) };
        if res < 0 {
            $crate::Result::Err($crate::Error::Syscall { syscall: stringify!($fn), errno: unsafe { *libc::__errno_location() }, ret: res as i32 })
        } else {
            $crate::Result::Ok(res)
        }
    }};
}

#[derive(Debug)]
pub(crate) struct Poll {
    epoll_fd: RawFd,
    n_sources: usize,
}

impl Poll {
    pub(crate) fn new() -> Result<Poll> {
        syscall!(epoll_create1(EPOLL_CLOEXEC)).map(|ep| Poll {
            epoll_fd: ep,
            n_sources: 0,
        })
    }

    pub(crate) fn poll(&self, timeout: i32) -> Result<Vec<epoll_event>> {
        let size = max(self.n_sources, 1);
        let mut events = Vec::<epoll_event>::with_capacity(size);

        let n_ready = syscall!(epoll_wait(
            self.epoll_fd,
            events.as_mut_ptr(),
            events.capacity() as i32,
            timeout,
        ))?;

        unsafe {
            events.set_len(n_ready as usize);
        }

        Ok(events)
    }

    pub(crate) fn register(&mut self, fd: RawFd, event: &mut epoll_event) -> Result<()> {
        syscall!(epoll_ctl(self.epoll_fd, EPOLL_CTL_ADD, fd, event))?;
        self.n_sources += 1;
        Ok(())
    }

    pub(crate) fn unregister(&mut self, fd: RawFd) -> Result<()> {
        syscall!(epoll_ctl(self.epoll_fd, EPOLL_CTL_DEL, fd, ptr::null_mut()))?;
        self.n_sources = self.n_sources.saturating_sub(1);
        Ok(())
    }
}

impl Drop for Poll {
    fn drop(&mut self) {
        let _ = syscall!(close(self.epoll_fd));
    }
}

impl AsRawFd for Poll {
    fn as_raw_fd(&self) -> RawFd {
        self.epoll_fd
    }
}
