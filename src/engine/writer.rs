//! # G-code 写出
//!
//! 将引擎工作区中最近一次处理的输出写入目标流。
//!
//! ## 依赖关系
//! - 被 `batch/controller.rs` 通过 [`SceneWriter`] 调用

use super::{Scene, SceneWriter};

use std::io::Write;

/// 输出写出器
#[derive(Debug, Default)]
pub struct GcodeWriter {
    bytes_written: u64,
}

impl GcodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计写出的字节数
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl SceneWriter for GcodeWriter {
    fn write(&mut self, stream: &mut dyn Write, scene: &Scene) -> bool {
        let data = match scene.output.as_deref() {
            Some(data) if !data.is_empty() => data,
            _ => return false,
        };

        if stream.write_all(data).and_then(|_| stream.flush()).is_err() {
            return false;
        }

        self.bytes_written += data.len() as u64;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenStream;

    impl Write for BrokenStream {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_scene_output() {
        let scene = Scene {
            models: vec![],
            output: Some(b";FLAVOR:Marlin\nG28\n".to_vec()),
        };
        let mut writer = GcodeWriter::new();
        let mut buf = Vec::new();

        assert!(writer.write(&mut buf, &scene));
        assert_eq!(buf, b";FLAVOR:Marlin\nG28\n");
        assert_eq!(writer.bytes_written(), 19);
    }

    #[test]
    fn test_nothing_to_write() {
        let mut writer = GcodeWriter::new();
        let mut buf = Vec::new();
        assert!(!writer.write(&mut buf, &Scene::default()));

        let empty = Scene {
            models: vec![],
            output: Some(Vec::new()),
        };
        assert!(!writer.write(&mut buf, &empty));
    }

    #[test]
    fn test_stream_failure() {
        let scene = Scene {
            models: vec![],
            output: Some(b"G28\n".to_vec()),
        };
        let mut writer = GcodeWriter::new();
        assert!(!writer.write(&mut BrokenStream, &scene));
        assert_eq!(writer.bytes_written(), 0);
    }
}
