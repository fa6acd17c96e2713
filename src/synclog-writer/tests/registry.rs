use std::{
    fs,
    sync::{Arc, Barrier},
    thread,
};

use synclog_writer::{verify::verify, CallerId, WriterError, WriterRegistry};

#[test]
fn same_path_same_writer() -> Result<(), WriterError> {
    let dir = tempfile::tempdir().unwrap();
    let registry = WriterRegistry::new();

    let a = registry.open(dir.path().join("out.txt"))?;
    let b = registry.open(dir.path().join(".").join("out.txt"))?;

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);

    Ok(())
}

#[test]
fn parent_components_same_writer() -> Result<(), WriterError> {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let registry = WriterRegistry::new();

    let a = registry.open(dir.path().join("out.txt"))?;
    a.log(CallerId::new(1));

    let b = registry.open(dir.path().join("sub").join("..").join("out.txt"))?;
    b.log(CallerId::new(2));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);

    // Reopening must not truncate the file or write a second header.
    registry.close_all()?;
    let contents = fs::read_to_string(dir.path().join("out.txt")).unwrap();
    let summary = verify(contents.as_bytes()).unwrap();
    assert_eq!(summary.records, 3);
    assert_eq!(summary.callers["1"], 1);
    assert_eq!(summary.callers["2"], 1);

    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_directory_same_writer() -> Result<(), WriterError> {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let real = dir.path().join("real");
    let link = dir.path().join("link");
    fs::create_dir(&real).unwrap();
    symlink(&real, &link).unwrap();

    let registry = WriterRegistry::new();
    let a = registry.open(real.join("out.txt"))?;
    let b = registry.open(link.join("out.txt"))?;

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);

    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_file_same_writer() -> Result<(), WriterError> {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let registry = WriterRegistry::new();

    let a = registry.open(dir.path().join("out.txt"))?;
    symlink(dir.path().join("out.txt"), dir.path().join("alias.txt")).unwrap();
    let b = registry.open(dir.path().join("alias.txt"))?;

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 1);

    Ok(())
}

#[test]
fn distinct_paths_distinct_writers() -> Result<(), WriterError> {
    let dir = tempfile::tempdir().unwrap();
    let registry = WriterRegistry::new();

    let a = registry.open(dir.path().join("a.txt"))?;
    let b = registry.open(dir.path().join("b.txt"))?;

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(registry.len(), 2);

    Ok(())
}

#[test]
fn concurrent_open_creates_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let registry = WriterRegistry::new();
    let barrier = Barrier::new(8);

    let writers: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.open(&path).unwrap()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(writers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
    assert_eq!(writers[0].count(), 1);

    // A second construction would have truncated the file and written
    // another header.
    writers[0].log(CallerId::new(1));
    registry.close_all().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn open_failure_registers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = WriterRegistry::new();

    let err = registry
        .open(dir.path().join("missing").join("out.txt"))
        .unwrap_err();

    assert!(matches!(err, WriterError::Resource { .. }));
    assert!(registry.is_empty());
}

#[test]
fn close_all_closes_everything() -> Result<(), WriterError> {
    let dir = tempfile::tempdir().unwrap();
    let registry = WriterRegistry::new();

    let a = registry.open(dir.path().join("a.txt"))?;
    let b = registry.open(dir.path().join("b.txt"))?;

    registry.close_all()?;
    assert!(a.is_closed());
    assert!(b.is_closed());

    // Closed writers stay registered.
    let again = registry.open(dir.path().join("a.txt"))?;
    assert!(Arc::ptr_eq(&a, &again));
    assert!(again.is_closed());

    registry.close_all()
}
