// 基于 mmap 的只追加字节 arena
// 存放 native 方法捕获表的全部字符串，进程退出前整块 munmap，不逐个析构元素
use crate::errno::Errno;
use crate::log;
use std::hash::{Hash, Hasher};
use std::ptr::{self, NonNull};

const CHUNK_SIZE: usize = 64 * 1024;

struct Chunk {
    base: NonNull<u8>,
    len: usize,
    used: usize,
}

impl Chunk {
    fn map(len: usize) -> Result<Self, Errno> {
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            log::error(format_args!("arena: mmap {len} bytes failed"));
            return Err(Errno::NoMem);
        }
        let base = NonNull::new(addr as *mut u8).ok_or(Errno::NoMem)?;
        Ok(Self { base, len, used: 0 })
    }

    fn remaining(&self) -> usize {
        self.len - self.used
    }
}

pub(crate) struct Arena {
    chunks: Vec<Chunk>,
}

// chunk 仅由持有者访问，裸指针不跨越所有权边界
unsafe impl Send for Arena {}

impl Arena {
    pub(crate) const fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    // 拷贝字符串字节到 arena，返回指向 arena 内存的视图
    pub(crate) fn alloc_str(&mut self, value: &str) -> Result<RawStr, Errno> {
        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return Ok(RawStr::EMPTY);
        }

        let fits = self
            .chunks
            .last()
            .is_some_and(|chunk| chunk.remaining() >= bytes.len());
        if !fits {
            let len = round_up(bytes.len().max(CHUNK_SIZE), page_size());
            self.chunks.push(Chunk::map(len)?);
        }
        let chunk = self.chunks.last_mut().ok_or(Errno::NoMem)?;

        let dst = unsafe { chunk.base.as_ptr().add(chunk.used) };
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) };
        chunk.used += bytes.len();
        Ok(RawStr {
            ptr: dst,
            len: bytes.len(),
        })
    }

    #[cfg(test)]
    pub(crate) fn mapped_bytes(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.len).sum()
    }

    #[cfg(test)]
    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    // 整块释放：只做 munmap，不读取也不析构任何已分配内容
    // 仅在进程卸载阶段调用，之后所有 RawStr 视图失效
    pub(crate) fn release(mut self) {
        self.unmap_all();
    }

    fn unmap_all(&mut self) {
        for chunk in self.chunks.drain(..) {
            let ret = unsafe { libc::munmap(chunk.base.as_ptr() as *mut libc::c_void, chunk.len) };
            if ret != 0 {
                log::warn(format_args!("arena: munmap {} bytes failed", chunk.len));
            }
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.unmap_all();
    }
}

fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 { 4096 } else { size as usize }
}

fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

// 无所有权的字节视图，相等与哈希按内容比较
// 既可指向 arena 内存，也可临时指向调用方的 &str 用于查表
#[derive(Clone, Copy)]
pub(crate) struct RawStr {
    ptr: *const u8,
    len: usize,
}

unsafe impl Send for RawStr {}

impl RawStr {
    pub(crate) const EMPTY: RawStr = RawStr {
        ptr: NonNull::<u8>::dangling().as_ptr(),
        len: 0,
    };

    // 临时视图，生命周期不得超过 value
    pub(crate) fn view(value: &str) -> Self {
        Self {
            ptr: value.as_ptr(),
            len: value.len(),
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub(crate) fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl PartialEq for RawStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for RawStr {}

impl Hash for RawStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}
