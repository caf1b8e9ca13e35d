//! Generic netlink socket transport.
//!
//! Owns the datagram socket and its reactor registration. All I/O is
//! non-blocking: sends complete in a single syscall (a short write is an
//! error, netlink frames are one datagram each) and receives drain the
//! socket until it would block, yielding datagrams in receipt order.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use super::error::{Error, Result};

/// Per-datagram receive buffer capacity. nl80211 wiphy dumps are the
/// largest frames this socket sees and stay well under this.
const RECV_CAPACITY: usize = 32768;

/// Kernel-side socket buffer size requested at open, sized for event
/// bursts while the process is busy.
const KERNEL_BUF_SIZE: usize = 512 * 1024;

/// Async generic netlink socket.
pub struct NetlinkSocket {
    /// The socket, registered with the tokio reactor.
    fd: AsyncFd<Socket>,
    /// Local port ID (assigned by kernel at bind).
    pid: u32,
}

impl NetlinkSocket {
    /// Create, bind and tune a generic netlink socket and register it with
    /// the reactor. Any failing step is a setup error.
    pub fn open() -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_GENERIC)
            .map_err(Error::setup("creating netlink socket"))?;
        socket
            .set_non_blocking(true)
            .map_err(Error::setup("setting netlink socket non-blocking"))?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket
            .bind(&addr)
            .map_err(Error::setup("binding netlink socket"))?;
        socket
            .get_address(&mut addr)
            .map_err(Error::setup("reading netlink socket address"))?;
        let pid = addr.port_number();

        set_buf_size(socket.as_raw_fd(), libc::SO_RCVBUF, KERNEL_BUF_SIZE)
            .map_err(Error::setup("tuning netlink receive buffer"))?;
        set_buf_size(socket.as_raw_fd(), libc::SO_SNDBUF, KERNEL_BUF_SIZE)
            .map_err(Error::setup("tuning netlink send buffer"))?;

        let fd =
            AsyncFd::new(socket).map_err(Error::setup("registering netlink socket with reactor"))?;

        debug!(pid, "netlink socket bound");
        Ok(Self { fd, pid })
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Join a multicast group.
    pub fn join_group(&mut self, group: u32) -> Result<()> {
        self.fd.get_mut().add_membership(group)?;
        Ok(())
    }

    /// Send one frame as a single datagram.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    let written = result?;
                    if written != msg.len() {
                        return Err(Error::ShortSend {
                            written,
                            len: msg.len(),
                        });
                    }
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Wait for readability, then drain every pending datagram.
    ///
    /// Returns at least one datagram; keeps reading until the socket would
    /// block so a burst of kernel events is consumed in one pass.
    pub async fn recv_batch(&self) -> Result<Vec<Vec<u8>>> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;
            let mut datagrams = Vec::new();

            loop {
                let mut buf = BytesMut::with_capacity(RECV_CAPACITY);
                match guard.try_io(|inner| inner.get_ref().recv(&mut buf, 0)) {
                    Ok(Ok(_n)) => datagrams.push(buf.to_vec()),
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_would_block) => break,
                }
            }

            if !datagrams.is_empty() {
                return Ok(datagrams);
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

fn set_buf_size(fd: RawFd, option: libc::c_int, size: usize) -> io::Result<()> {
    let size = size as libc::c_int;
    // SAFETY: fd is a valid open socket and the option value points at a
    // properly sized c_int.
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            option,
            &size as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
