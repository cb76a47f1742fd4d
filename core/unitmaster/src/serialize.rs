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

//! The text stream carrying manager and unit state across reload/reexec.
//!
//! One `key=value` pair per line, a blank line terminates a record. File
//! descriptors are not written into the stream; their index in the sidecar
//! [`FdSet`] is. Unknown keys are skipped on the receiving side so newer
//! serializers stay readable by older deserializers.

use crate::error::*;
use basic::time_util::DualTimestamp;
use std::io::{BufRead, Write};
use std::os::unix::io::RawFd;

/// The sidecar set of file descriptors handed across reexec.
#[derive(Debug, Default)]
pub struct FdSet {
    fds: Vec<RawFd>,
}

impl FdSet {
    pub fn new() -> FdSet {
        FdSet { fds: Vec::new() }
    }

    /// Store a descriptor, returning the index to put into the stream.
    pub fn push(&mut self, fd: RawFd) -> usize {
        self.fds.push(fd);
        self.fds.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<RawFd> {
        self.fds.get(index).copied().filter(|fd| *fd >= 0)
    }

    /// Remove a descriptor from the set, handing ownership to the caller.
    pub fn take(&mut self, index: usize) -> Option<RawFd> {
        let slot = self.fds.get_mut(index)?;
        let fd = *slot;
        *slot = basic::INVALID_FD;
        if fd >= 0 {
            Some(fd)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.fds.iter().filter(|fd| **fd >= 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close every descriptor still owned by the set.
    pub fn close_all(&mut self) {
        for fd in self.fds.drain(..) {
            basic::fd_util::close(fd);
        }
    }
}

/// Writes one record of `key=value` lines.
pub struct Serializer<'a> {
    buf: &'a mut dyn Write,
    fds: &'a mut FdSet,
}

impl<'a> Serializer<'a> {
    pub fn new(buf: &'a mut dyn Write, fds: &'a mut FdSet) -> Serializer<'a> {
        Serializer { buf, fds }
    }

    pub fn item(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains('=') || key.contains('\n') || value.contains('\n') {
            return Err(Error::InvalidData);
        }
        writeln!(self.buf, "{}={}", key, value).context(IoSnafu)
    }

    pub fn item_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.item(key, if value { "yes" } else { "no" })
    }

    pub fn item_u64(&mut self, key: &str, value: u64) -> Result<()> {
        self.item(key, &value.to_string())
    }

    /// Timestamps travel as a "realtime monotonic" usec pair.
    pub fn item_dual_ts(&mut self, key: &str, ts: &DualTimestamp) -> Result<()> {
        self.item(key, &format!("{} {}", ts.realtime, ts.monotonic))
    }

    /// Hand a descriptor over through the fd set, storing its index.
    pub fn item_fd(&mut self, key: &str, fd: RawFd) -> Result<()> {
        if fd < 0 {
            return Err(Error::InvalidData);
        }
        let index = self.fds.push(fd);
        self.item(key, &index.to_string())
    }

    /// Terminate the current record.
    pub fn end_record(&mut self) -> Result<()> {
        writeln!(self.buf).context(IoSnafu)
    }
}

/// One parsed record of the stream.
#[derive(Debug, Default)]
pub struct Record {
    items: Vec<(String, String)>,
}

impl Record {
    /// Read the next record, None at end of stream.
    pub fn read(reader: &mut dyn BufRead) -> Result<Option<Record>> {
        let mut items = Vec::new();
        let mut saw_any = false;

        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).context(IoSnafu)?;
            if n == 0 {
                // end of stream
                if saw_any {
                    break;
                }
                return Ok(None);
            }
            let line = line.trim_end_matches('\n');
            if line.is_empty() {
                break;
            }
            saw_any = true;
            match line.split_once('=') {
                Some((key, value)) => items.push((key.to_string(), value.to_string())),
                None => log::debug!("Skipping malformed serialization line: {}", line),
            }
        }

        Ok(Some(Record { items }))
    }

    pub fn items(&self) -> &[(String, String)] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some("yes") | Some("true") | Some("1") => Some(true),
            Some("no") | Some("false") | Some("0") => Some(false),
            _ => None,
        }
    }

    pub fn get_dual_ts(&self, key: &str) -> Option<DualTimestamp> {
        let v = self.get(key)?;
        let (rt, mt) = v.split_once(' ')?;
        Some(DualTimestamp {
            realtime: rt.parse().ok()?,
            monotonic: mt.parse().ok()?,
        })
    }
}

/// Skip the rest of the current record, for keys nobody understands anymore.
pub fn deserialize_skip(reader: &mut dyn BufRead) -> Result<()> {
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).context(IoSnafu)?;
        if n == 0 || line.trim_end_matches('\n').is_empty() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn record_round_trip() {
        let mut buf = Vec::new();
        let mut fds = FdSet::new();
        {
            let mut ser = Serializer::new(&mut buf, &mut fds);
            ser.item("unit", "foo.service").unwrap();
            ser.item_bool("condition-result", true).unwrap();
            ser.item_u64("n-restarts", 7).unwrap();
            ser.end_record().unwrap();
            ser.item("unit", "bar.target").unwrap();
            ser.end_record().unwrap();
        }

        let mut cur = Cursor::new(buf);
        let rec = Record::read(&mut cur).unwrap().unwrap();
        assert_eq!(rec.get("unit"), Some("foo.service"));
        assert_eq!(rec.get_bool("condition-result"), Some(true));
        assert_eq!(rec.get_u64("n-restarts"), Some(7));
        assert_eq!(rec.get("no-such-key"), None);

        let rec = Record::read(&mut cur).unwrap().unwrap();
        assert_eq!(rec.get("unit"), Some("bar.target"));

        assert!(Record::read(&mut cur).unwrap().is_none());
    }

    #[test]
    fn rejects_embedded_newline() {
        let mut buf = Vec::new();
        let mut fds = FdSet::new();
        let mut ser = Serializer::new(&mut buf, &mut fds);
        assert!(ser.item("key", "a\nb").is_err());
        assert!(ser.item("bad=key", "v").is_err());
    }

    #[test]
    fn fd_handoff_index() {
        let fd = nix::unistd::dup(0).unwrap();
        let mut buf = Vec::new();
        let mut fds = FdSet::new();
        {
            let mut ser = Serializer::new(&mut buf, &mut fds);
            ser.item_fd("notify-socket-fd", fd).unwrap();
            ser.end_record().unwrap();
        }
        assert_eq!(fds.len(), 1);

        let mut cur = Cursor::new(buf);
        let rec = Record::read(&mut cur).unwrap().unwrap();
        let index = rec.get_u64("notify-socket-fd").unwrap() as usize;
        assert_eq!(fds.take(index), Some(fd));
        assert_eq!(fds.take(index), None);
        basic::fd_util::close(fd);
    }

    #[test]
    fn skip_record() {
        let data = b"a=1\nb=2\n\nc=3\n\n".to_vec();
        let mut cur = Cursor::new(data);
        deserialize_skip(&mut cur).unwrap();
        let rec = Record::read(&mut cur).unwrap().unwrap();
        assert_eq!(rec.get("c"), Some("3"));
    }
}
