// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `PacketSniffer`: an `AF_INET`/`SOCK_RAW`/`IPPROTO_TCP` socket with a
//! classic-BPF filter attached via `SO_ATTACH_FILTER` (spec §4.1).
//!
//! Raw sockets have no safe wrapper in `libc` or `std`; this is the one
//! module in the workspace where `unsafe` is allowed.
#![allow(unsafe_code)]

use super::filter::{compile, SockFilter};
use super::{PacketSniffer, SnifferHandle};
use agentcore::{Error, TcpPacket, TcpPattern, IPV4_HEADER_LEN, MAX_FRAME_LEN, TCP_HEADER_LEN};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Linux's `SO_ATTACH_FILTER`, not exposed by the `libc` crate.
const SO_ATTACH_FILTER: libc::c_int = 26;

#[repr(C)]
struct SockFprog {
    len: u16,
    filter: *const SockFilter,
}

pub struct RawSocketSniffer;

impl Default for RawSocketSniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RawSocketSniffer {
    pub fn new() -> Self {
        RawSocketSniffer
    }
}

/// Opens the socket and attaches `program`. Safety: all arguments are valid
/// for the duration of the call; `fd` is closed by the caller on every path.
unsafe fn open_filtered_socket(program: &[SockFilter]) -> Result<RawFd, Error> {
    let fd = libc::socket(libc::AF_INET, libc::SOCK_RAW, libc::IPPROTO_TCP);
    if fd < 0 {
        return Err(Error::CreateSocket(std::io::Error::last_os_error().to_string()));
    }

    let fprog = SockFprog { len: program.len() as u16, filter: program.as_ptr() };
    let ret = libc::setsockopt(
        fd,
        libc::SOL_SOCKET,
        SO_ATTACH_FILTER,
        &fprog as *const SockFprog as *const libc::c_void,
        std::mem::size_of::<SockFprog>() as libc::socklen_t,
    );
    if ret < 0 {
        let err = Error::ApplyFilter(std::io::Error::last_os_error().to_string());
        libc::close(fd);
        return Err(err);
    }

    Ok(fd)
}

fn read_loop(fd: RawFd, tx: mpsc::Sender<TcpPacket>) {
    let mut buf = vec![0u8; MAX_FRAME_LEN];
    loop {
        // Safety: `fd` is a valid, open socket for the lifetime of this loop;
        // `buf` is sized and owned for the duration of the call.
        let n = unsafe {
            libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
        };
        if n < 0 {
            debug!(error = %std::io::Error::last_os_error(), "sniffer read loop exiting");
            break;
        }
        if (n as usize) < IPV4_HEADER_LEN + TCP_HEADER_LEN {
            continue;
        }
        match TcpPacket::decode(&buf[..n as usize]) {
            Ok(packet) => {
                if tx.blocking_send(packet).is_err() {
                    break;
                }
            }
            Err(err) => warn!(%err, "failed to decode captured segment"),
        }
    }
}

impl PacketSniffer for RawSocketSniffer {
    fn capture(&self, pattern: TcpPattern) -> Result<(SnifferHandle, mpsc::Receiver<TcpPacket>), Error> {
        let program = compile(pattern)?;
        // Safety: `program` outlives the call, `open_filtered_socket` closes
        // `fd` itself on every error path.
        let fd = unsafe { open_filtered_socket(&program)? };

        let (tx, rx) = mpsc::channel(64);
        std::thread::spawn(move || read_loop(fd, tx));

        let closed_fd = Arc::new(AtomicI32::new(fd));
        let handle = SnifferHandle::new(move || {
            let fd = closed_fd.swap(-1, Ordering::SeqCst);
            if fd >= 0 {
                // Safety: `fd` was opened by `capture` above and not yet closed.
                unsafe {
                    libc::close(fd);
                }
            }
        });
        Ok((handle, rx))
    }
}
