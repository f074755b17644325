#![allow(dead_code)]

use codesense::{CodeIndexer, CodeStore, FallbackEmbedder, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Settings rooted at the project, with no batch pause
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.workspace_root = Some(self.path().to_path_buf());
        settings.indexing.batch_pause_ms = 0;
        settings.indexing.parallel_threads = 2;
        settings.embedding.model_enabled = false;
        settings
    }

    /// Indexer backed by an on-disk database under the project
    pub fn indexer(&self) -> CodeIndexer {
        self.indexer_with(self.settings())
    }

    pub fn indexer_with(&self, settings: Settings) -> CodeIndexer {
        let store = CodeStore::open(self.path().join(".codesense").join("cache.db"))
            .expect("Failed to open cache");
        CodeIndexer::with_components(
            Arc::new(settings),
            store,
            FallbackEmbedder::heuristic_only(),
        )
        .expect("Failed to build indexer")
    }
}

pub mod sample_code {
    pub const FOO_EXTENDS_BAR: &str = "class Foo extends Bar { getInstance() {} }";

    pub const TS_SHAPES: &str = r#"import { Renderer } from './renderer';

export interface Shape {
    area(): number;
}

export class Square implements Shape {
    constructor(private side: number) {}
    area(): number { return this.side * this.side; }
}

export class Circle implements Shape {
    constructor(private radius: number) {}
    area(): number { return Math.PI * this.radius * this.radius; }
}
"#;

    pub const PY_SERVICE: &str = r#"import logging
from typing import List

class Service(Base, Mixin):
    def subscribe(self, handler):
        self.handlers.append(handler)

    def notify(self, event):
        for h in self.handlers:
            h(event)
"#;

    pub const JAVA_SINGLETON: &str = r#"package com.example;

public class Registry {
    private static Registry instance;

    public static Registry getInstance() {
        if (instance == null) {
            instance = new Registry();
        }
        return instance;
    }
}
"#;
}
