use super::HideDaemon;
use crate::config::Config;
use crate::errno::Errno;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

// 请求码，native endian i32
pub const REQUEST_HIDE: i32 = 1;
pub const CHECK_HIDE: i32 = 2;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

// 每次请求新建一条 Unix 流连接，读写均有超时
#[derive(Clone, Debug)]
pub struct SocketDaemon {
    path: PathBuf,
    timeout: Duration,
}

impl SocketDaemon {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout: timeout.max(MIN_TIMEOUT),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.daemon_socket.clone(), config.daemon_timeout)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<UnixStream, Errno> {
        let stream = UnixStream::connect(&self.path).map_err(|_| Errno::Daemon)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|_| Errno::Daemon)?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|_| Errno::Daemon)?;
        Ok(stream)
    }
}

impl HideDaemon for SocketDaemon {
    fn check_hide(&self, uid: i32, process_name: &str) -> Result<bool, Errno> {
        let mut stream = self.connect()?;
        write_i32(&mut stream, CHECK_HIDE)?;
        write_i32(&mut stream, uid)?;
        write_string(&mut stream, process_name)?;
        Ok(read_i32(&mut stream)? != 0)
    }

    fn request_hide(&self) -> Result<(), Errno> {
        let mut stream = self.connect()?;
        write_i32(&mut stream, REQUEST_HIDE)
    }
}

fn write_i32(stream: &mut UnixStream, value: i32) -> Result<(), Errno> {
    stream
        .write_all(&value.to_ne_bytes())
        .map_err(|_| Errno::Daemon)
}

// 长度前缀 + 字节内容，不带结尾 NUL
fn write_string(stream: &mut UnixStream, value: &str) -> Result<(), Errno> {
    let len = i32::try_from(value.len()).map_err(|_| Errno::InvalidArg)?;
    write_i32(stream, len)?;
    stream
        .write_all(value.as_bytes())
        .map_err(|_| Errno::Daemon)
}

fn read_i32(stream: &mut UnixStream) -> Result<i32, Errno> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => Errno::BadResponse,
        _ => Errno::Daemon,
    })?;
    Ok(i32::from_ne_bytes(buf))
}
