use std::path::PathBuf;

mod common;

#[test]
fn test_creates_and_removes_db_files() {
    let path: PathBuf;
    {
        let test_db = common::TestDb::new("test_creates_and_removes_db_files.db");
        let conn = test_db.pool().get();
        assert!(conn.is_ok());
        path = test_db.path().clone();
        assert!(path.exists());
    }
    assert!(!path.exists());
}
