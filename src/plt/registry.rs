use crate::errno::Errno;
use crate::log;
use regex::Regex;
use std::ffi::{CString, c_void};
use std::sync::atomic::{AtomicPtr, Ordering};

use super::{OrigSlot, SymbolPatcher};

// 一条已登记的符号 hook：路径规则、符号名、原函数地址槽
struct InstalledHook {
    path_regex: CString,
    symbol: CString,
    slot: &'static AtomicPtr<c_void>,
}

impl InstalledHook {
    fn resolved(&self) -> bool {
        !self.slot.load(Ordering::Acquire).is_null()
    }

    fn symbol_name(&self) -> String {
        self.symbol.to_string_lossy().into_owned()
    }
}

// 进程内唯一的符号 hook 登记表，按安装顺序保存
pub struct HookRegistry {
    patcher: Box<dyn SymbolPatcher>,
    hooks: Vec<InstalledHook>,
}

impl HookRegistry {
    pub fn new(patcher: Box<dyn SymbolPatcher>) -> Self {
        Self {
            patcher,
            hooks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn is_installed(&self, symbol: &str) -> bool {
        self.hooks
            .iter()
            .any(|hook| hook.symbol.as_bytes() == symbol.as_bytes())
    }

    // 登记一条替换，原函数地址在 commit 成功后写入 slot
    pub fn install<F: Copy>(
        &mut self,
        path_regex: &str,
        symbol: &str,
        new_func: *mut c_void,
        slot: &'static OrigSlot<F>,
    ) -> Result<(), Errno> {
        if symbol.is_empty() || new_func.is_null() {
            return Err(Errno::InvalidArg);
        }
        if let Err(err) = Regex::new(path_regex) {
            log::error(format_args!(
                "hook: invalid path pattern \"{path_regex}\" for \"{symbol}\": {err}"
            ));
            return Err(Errno::InvalidArg);
        }
        let path_c = CString::new(path_regex).map_err(|_| Errno::InvalidArg)?;
        let symbol_c = CString::new(symbol).map_err(|_| Errno::InvalidArg)?;

        let ret = unsafe {
            self.patcher
                .register(&path_c, &symbol_c, new_func, slot.cell().as_ptr())
        };
        if ret != 0 {
            log::error(format_args!(
                "hook: failed to register hook \"{symbol}\" ret={ret}"
            ));
            return Err(Errno::Register);
        }

        log::debug(format_args!("hook: registered \"{symbol}\" in {path_regex}"));
        self.hooks.push(InstalledHook {
            path_regex: path_c,
            symbol: symbol_c,
            slot: slot.cell(),
        });
        Ok(())
    }

    // 应用所有待生效的登记，成功后清空底层登记列表
    pub fn commit(&mut self) -> bool {
        let ret = self.patcher.refresh();
        if ret == 0 {
            self.patcher.clear();
            log::info(format_args!("hook: refresh success"));
            true
        } else {
            log::error(format_args!("hook: refresh failed ret={ret}"));
            false
        }
    }

    // 移除 slot 从未被回填的记录（符号在目标库中不存在）
    pub fn prune(&mut self) -> usize {
        let before = self.hooks.len();
        self.hooks.retain(|hook| {
            if hook.resolved() {
                return true;
            }
            log::warn(format_args!(
                "hook: \"{}\" not found, drop record",
                hook.symbol_name()
            ));
            false
        });
        before - self.hooks.len()
    }

    // 按安装的逆序逐条以原函数地址重新登记并刷新
    // 任一条登记失败即停止：已处理的部分照常刷新生效，其余保持 hook 状态
    pub fn uninstall_all(&mut self) -> bool {
        if self.hooks.is_empty() {
            return true;
        }

        let mut restored = 0usize;
        let mut failed = false;
        for hook in self.hooks.iter().rev() {
            let orig = hook.slot.load(Ordering::Acquire);
            let ret = unsafe {
                self.patcher
                    .register(&hook.path_regex, &hook.symbol, orig, std::ptr::null_mut())
            };
            if ret != 0 {
                log::error(format_args!(
                    "hook: failed to restore \"{}\" ret={ret}",
                    hook.symbol_name()
                ));
                failed = true;
                break;
            }
            restored += 1;
        }

        let committed = if restored > 0 { self.commit() } else { true };
        if committed {
            let remaining = self.hooks.len() - restored;
            self.hooks.truncate(remaining);
        }
        if !self.hooks.is_empty() {
            log::warn(format_args!(
                "hook: {} symbol hooks still installed after uninstall",
                self.hooks.len()
            ));
        }
        !failed && committed
    }

    pub fn lookup_symbol(&self, symbol: &str) -> *mut c_void {
        let Ok(symbol_c) = CString::new(symbol) else {
            return std::ptr::null_mut();
        };
        self.patcher.lookup(&symbol_c)
    }
}
