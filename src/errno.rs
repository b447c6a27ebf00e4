// 注入引擎错误码，0 表示成功
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Errno {
    Ok = 0,              // 成功
    Uninit = 1,          // 未安装或已卸载
    Repeat = 2,          // 重复安装
    InvalidArg = 3,      // 参数无效
    Register = 4,        // 符号 hook 注册失败
    Refresh = 5,         // 符号 hook 刷新失败
    NoSym = 6,           // 符号未找到
    Restore = 7,         // 符号 hook 恢复失败
    NoEnv = 8,           // 无法获取 JNIEnv
    JniRestore = 9,      // 原始 native 方法重新注册失败
    JniLookup = 10,      // JNI 类或方法解析失败
    Daemon = 11,         // 守护进程不可达
    BadResponse = 12,    // 守护进程响应格式错误
    NoMem = 13,          // 内存映射失败
    Unknown = 1001,      // 未知错误
}

impl Errno {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<Errno> for i32 {
    fn from(value: Errno) -> Self {
        value as i32
    }
}
