//! # 路径层
//!
//! 以 `/` 开头的名字是绝对路径；相对名字由调用方
//! 先用 [`join`] 拼上它的工作目录（门面默认以根目录为基）。
//! 分词时剔除所有空分量，所以重复或收尾的 `/` 无关紧要。

use alloc::string::String;

/// 把名字规范成以 `/` 结尾的绝对路径：
/// 绝对名原样通过，相对名接在 `base` 之后
pub fn join(base: &str, name: &str) -> String {
    let mut path = if name.starts_with('/') {
        String::from(name)
    } else {
        let mut path = String::from(base);
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(name);
        path
    };
    path.push('/');
    path
}

/// 依次给出路径的非空分量
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|comp| !comp.is_empty())
}
