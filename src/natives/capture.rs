// 三级键 (类名, 方法名, 签名) -> 原函数指针 的捕获表
// 字符串存放在 Arena 中，索引的键值均为 Copy，释放时不逐项析构
use crate::arena::{Arena, RawStr};
use crate::errno::Errno;
use std::collections::{HashMap, HashSet};
use std::ffi::c_void;

type MethodKey = (RawStr, RawStr, RawStr);

pub(crate) struct CaptureTable {
    index: HashMap<MethodKey, usize>,
    interned: HashSet<RawStr>,
    arena: Arena,
}

impl CaptureTable {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            interned: HashSet::new(),
            arena: Arena::new(),
        }
    }

    // 重复键直接覆盖，后注册者生效
    pub(crate) fn record(
        &mut self,
        class: &str,
        name: &str,
        signature: &str,
        func: *mut c_void,
    ) -> Result<(), Errno> {
        let key = (RawStr::view(class), RawStr::view(name), RawStr::view(signature));
        if let Some(slot) = self.index.get_mut(&key) {
            *slot = func as usize;
            return Ok(());
        }
        let key = (
            self.intern(class)?,
            self.intern(name)?,
            self.intern(signature)?,
        );
        self.index.insert(key, func as usize);
        Ok(())
    }

    pub(crate) fn lookup(&self, class: &str, name: &str, signature: &str) -> Option<*mut c_void> {
        let key = (RawStr::view(class), RawStr::view(name), RawStr::view(signature));
        self.index.get(&key).map(|func| *func as *mut c_void)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn class_len(&self, class: &str) -> usize {
        let class = RawStr::view(class);
        self.index.keys().filter(|key| key.0 == class).count()
    }

    pub(crate) fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .index
            .keys()
            .map(|key| key.0.to_string_lossy())
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    // 卸载阶段整块释放：索引只释放自身存储，字符串随 arena 一次 munmap
    pub(crate) fn release(self) {
        let CaptureTable {
            index,
            interned,
            arena,
        } = self;
        drop(index);
        drop(interned);
        arena.release();
    }

    fn intern(&mut self, value: &str) -> Result<RawStr, Errno> {
        if let Some(existing) = self.interned.get(&RawStr::view(value)) {
            return Ok(*existing);
        }
        let stored = self.arena.alloc_str(value)?;
        self.interned.insert(stored);
        Ok(stored)
    }
}

impl Default for CaptureTable {
    fn default() -> Self {
        Self::new()
    }
}
