//! # 工作队列
//!
//! 每次运行由发现结果构建一次，逐个弹出直到为空。
//!
//! ## 依赖关系
//! - 被 `batch/controller.rs` 独占使用

use crate::models::{DiscoveredFile, QueueOrder};

use std::collections::VecDeque;

/// 待处理模型队列
#[derive(Debug)]
pub struct WorkQueue {
    items: VecDeque<DiscoveredFile>,
    order: QueueOrder,
}

impl WorkQueue {
    pub fn new(files: Vec<DiscoveredFile>, order: QueueOrder) -> Self {
        WorkQueue {
            items: files.into(),
            order,
        }
    }

    /// 取出下一个模型；`Lifo` 从列表末尾取
    pub fn pop(&mut self) -> Option<DiscoveredFile> {
        match self.order {
            QueueOrder::Fifo => self.items.pop_front(),
            QueueOrder::Lifo => self.items.pop_back(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
