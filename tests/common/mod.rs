#![allow(dead_code)]

pub mod project {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Creates a temporary project tree from `(relative path, contents)` pairs
    pub fn create_project(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, content) in files {
            write_file(dir.path(), name, content);
        }
        dir
    }

    /// Writes one file below `root`, creating parent directories
    pub fn write_file(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write project file");
    }
}

pub mod fixtures {
    /// `Numbers.Sum(ctx, SumRequest) (*SumResponse, error)` exposed over HTTP and RPC
    pub const NUMBERS: &str = r#"
package: numbers
interfaces:
  - name: Numbers
    annotations: ['@service(route="/")']
    methods:
      - name: Sum
        annotations: ['@http(method="post", route="/sum")', '@grpc()']
        params: [{ name: ctx, type: context.Context }, { name: req, type: SumRequest }]
        results: [{ type: "*SumResponse" }, { type: error }]
functions:
  - { name: New, results: [{ type: Numbers }] }
records:
  - name: SumRequest
    fields:
      - { name: A, type: int }
      - { name: B, type: int }
  - name: SumResponse
    fields:
      - { name: V, type: int }
"#;

    /// A service whose request carries a `[]string` URL parameter
    pub const TAGGED: &str = r#"
package: tagged
interfaces:
  - name: Tagged
    annotations: ['@service(route="/tagged")']
    methods:
      - name: Find
        annotations: ['@http(method="get", route="/{ids}/{name}")']
        params: [{ type: context.Context }, { type: FindRequest }]
        results: [{ type: error }]
functions:
  - { name: New, results: [{ type: Tagged }] }
records:
  - name: FindRequest
    fields:
      - { name: IDs, type: "[]string", tags: { url: ids } }
      - { name: Name, type: string, tags: { url: "name,required" } }
"#;

    /// A `Users` service without a route, in package `pkg`
    pub fn users_without_route(pkg: &str) -> String {
        format!(
            r#"
package: {pkg}
interfaces:
  - name: Users
    annotations: ['@service()']
functions:
  - {{ name: New, results: [{{ type: Users }}] }}
"#
        )
    }
}
