use super::*;
use crate::linter::TreesitterBasicLinter;
use std::fs;
use tempfile::TempDir;

const SAMPLE: &str = "This is a test file.\nThis file is for testing purposes.";

fn setup() -> (TempDir, Editor, PathBuf) {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.txt");
    fs::write(&file, SAMPLE).unwrap();
    let config = EditorConfig {
        history_dir: Some(dir.path().join(".history")),
        ..EditorConfig::default()
    };
    let linter = DefaultLinter::with_linters(vec![Box::new(TreesitterBasicLinter)]);
    let editor = Editor::with_linter(config, linter).unwrap();
    (dir, editor, file)
}

fn err_message(result: Result<ToolResult>) -> String {
    match result {
        Ok(r) => panic!("expected an error, got {:?}", r.output),
        Err(e) => {
            assert!(e.is_tool_error(), "not a tool error: {e}");
            e.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// view
// ---------------------------------------------------------------------------

#[test]
fn view_whole_file() {
    let (_dir, editor, file) = setup();
    let out = editor
        .execute(&EditRequest::new("view", &file))
        .unwrap()
        .output
        .unwrap();
    assert_eq!(
        out,
        format!(
            "Here's the result of running `cat -n` on {}:\n     1\tThis is a test file.\n     2\tThis file is for testing purposes.\n",
            file.display()
        )
    );
}

#[test]
fn view_range_to_end_of_file() {
    let (_dir, editor, file) = setup();
    let out = editor
        .execute(&EditRequest::new("view", &file).view_range(vec![2, -1]))
        .unwrap()
        .output
        .unwrap();
    assert!(out.contains("     2\tThis file is for testing purposes."));
    assert!(!out.contains("     1\t"));
}

#[test]
fn view_range_validation() {
    let (_dir, editor, file) = setup();

    let msg = err_message(editor.execute(&EditRequest::new("view", &file).view_range(vec![1])));
    assert!(msg.contains("It should be a list of two integers."));

    let msg = err_message(editor.execute(&EditRequest::new("view", &file).view_range(vec![0, 1])));
    assert!(msg.contains(
        "Its first element `0` should be within the range of lines of the file: [1, 2]."
    ));

    let msg = err_message(editor.execute(&EditRequest::new("view", &file).view_range(vec![1, 5])));
    assert!(msg.contains(
        "Its second element `5` should be smaller than the number of lines in the file: `2`."
    ));

    let msg = err_message(editor.execute(&EditRequest::new("view", &file).view_range(vec![2, 1])));
    assert!(msg.contains(
        "Its second element `1` should be greater than or equal to the first element `2`."
    ));
}

#[test]
fn view_directory_lists_two_levels_without_hidden() {
    let (dir, editor, _file) = setup();
    let root = dir.path().join("project");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join("sub/b.txt"), "b").unwrap();
    fs::write(root.join("sub/.secret"), "s").unwrap();
    fs::write(root.join(".hidden"), "h").unwrap();

    let out = editor
        .execute(&EditRequest::new("view", &root))
        .unwrap()
        .output
        .unwrap();
    let r = root.display();
    assert_eq!(
        out,
        format!(
            "Here's the files and directories up to 2 levels deep in {r}, excluding hidden items:\n{r}/\n{r}/a.txt\n{r}/sub/\n{r}/sub/b.txt\n\n1 hidden files/directories in this directory are excluded. You can use 'ls -la {r}' to see them."
        )
    );
}

#[test]
fn view_symlinked_directory() {
    let (dir, editor, _file) = setup();
    let source = dir.path().join("source_dir");
    fs::create_dir_all(source.join("subdir")).unwrap();
    fs::write(source.join("file1.txt"), "content1").unwrap();
    fs::write(source.join("subdir/file3.txt"), "content3").unwrap();
    let link = dir.path().join("symlink_dir");
    std::os::unix::fs::symlink(&source, &link).unwrap();

    let out = editor
        .execute(&EditRequest::new("view", &link))
        .unwrap()
        .output
        .unwrap();
    assert!(out.contains(&link.display().to_string()));
    assert!(out.contains("file1.txt"));
    assert!(out.contains("subdir/"));
    assert!(out.contains("file3.txt"));
}

#[test]
fn view_directory_rejects_range() {
    let (dir, editor, _file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("view", dir.path()).view_range(vec![1, 2])));
    assert!(msg.contains("The `view_range` parameter is not allowed when `path` points to a directory."));
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

#[test]
fn create_writes_file_and_parents() {
    let (dir, editor, _file) = setup();
    let path = dir.path().join("nested/new.txt");
    let result = editor
        .execute(&EditRequest::new("create", &path).file_text("New file content"))
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "New file content");
    assert_eq!(
        result.output.unwrap(),
        format!("File created successfully at: {}", path.display())
    );
    assert!(!result.prev_exist);
}

#[test]
fn create_with_empty_text() {
    let (dir, editor, _file) = setup();
    let path = dir.path().join("empty.txt");
    editor
        .execute(&EditRequest::new("create", &path).file_text(""))
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn create_requires_file_text() {
    let (dir, editor, _file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("create", dir.path().join("x.txt"))));
    assert_eq!(msg, "Parameter `file_text` is required for command: create.");
}

#[test]
fn create_refuses_existing_file() {
    let (_dir, editor, file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("create", &file).file_text("x")));
    assert!(msg.contains("Cannot overwrite files using command `create`."));
    assert_eq!(fs::read_to_string(&file).unwrap(), SAMPLE);
}

// ---------------------------------------------------------------------------
// str_replace
// ---------------------------------------------------------------------------

#[test]
fn str_replace_renders_snippet() {
    let (_dir, editor, file) = setup();
    let result = editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("test file")
                .new_str("sample file"),
        )
        .unwrap();
    let p = file.display();
    assert_eq!(
        result.output.as_deref().unwrap(),
        format!(
            "The file {p} has been edited. Here's the result of running `cat -n` on a snippet of {p}:\n     1\tThis is a sample file.\n     2\tThis file is for testing purposes.\nReview the changes and make sure they are as expected. Edit the file again if necessary."
        )
    );
    assert_eq!(result.old_content.as_deref(), Some(SAMPLE));
    assert!(fs::read_to_string(&file)
        .unwrap()
        .contains("This is a sample file."));
}

#[test]
fn str_replace_multi_line() {
    let (_dir, editor, file) = setup();
    editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("This is a test file.\nThis file is for testing purposes.")
                .new_str("This is a sample file.\nThis file is for testing purposes."),
        )
        .unwrap();
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "This is a sample file.\nThis file is for testing purposes."
    );
}

#[test]
fn str_replace_expands_tabs() {
    let (dir, editor, _file) = setup();
    let file = dir.path().join("test.py");
    fs::write(&file, "def test():\n\tprint(\"Hello, World!\")").unwrap();
    let out = editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("def test():\n\tprint(\"Hello, World!\")")
                .new_str("def test():\n\tprint(\"Hello, Universe!\")"),
        )
        .unwrap()
        .output
        .unwrap();
    let p = file.display();
    assert_eq!(
        out,
        format!(
            "The file {p} has been edited. Here's the result of running `cat -n` on a snippet of {p}:\n     1\tdef test():\n     2\t        print(\"Hello, Universe!\")\nReview the changes and make sure they are as expected. Edit the file again if necessary."
        )
    );
}

#[test]
fn str_replace_with_linting_reports_clean_change() {
    let (_dir, editor, file) = setup();
    let out = editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("test file")
                .new_str("sample file")
                .lint(true),
        )
        .unwrap()
        .output
        .unwrap();
    assert!(out.contains(
        "purposes.\n\nNo linting issues found in the changes.\nReview the changes"
    ));
}

#[test]
fn str_replace_with_linting_reports_new_syntax_error() {
    let (dir, editor, _file) = setup();
    let file = dir.path().join("mod.py");
    fs::write(&file, "x = 1\ny = 2\n").unwrap();
    let out = editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("y = 2")
                .new_str("def broken(:\n    pass")
                .lint(true),
        )
        .unwrap()
        .output
        .unwrap();
    assert!(out.contains("Linting issues found in the changes:\n- Line "));
    assert!(out.contains("Syntax error"));
}

#[test]
fn str_replace_multiple_occurrences() {
    let (_dir, editor, file) = setup();
    let msg = err_message(
        editor.execute(
            &EditRequest::new("str_replace", &file)
                .old_str("test")
                .new_str("sample"),
        ),
    );
    assert!(msg.contains("Multiple occurrences of old_str `test`"));
    assert!(msg.contains("[1, 2]"));
}

#[test]
fn str_replace_multiple_multiline_occurrences() {
    let (_dir, editor, file) = setup();
    let block = "def example():\n    print(\"Hello\")\n    return True";
    fs::write(&file, format!("{block}\n\nprint('separator')\n\n{block}")).unwrap();
    let msg = err_message(
        editor.execute(
            &EditRequest::new("str_replace", &file)
                .old_str(block)
                .new_str("def new():\n    print(\"World\")"),
        ),
    );
    assert!(msg.contains("Multiple occurrences of old_str"));
    assert!(msg.contains("[1, 7]"));
}

#[test]
fn str_replace_missing_string() {
    let (_dir, editor, file) = setup();
    let msg = err_message(
        editor.execute(
            &EditRequest::new("str_replace", &file)
                .old_str("Non-existent Line")
                .new_str("New Line"),
        ),
    );
    assert_eq!(
        msg,
        format!(
            "No replacement was performed, old_str `Non-existent Line` did not appear verbatim in {}.",
            file.display()
        )
    );
}

#[test]
fn str_replace_with_empty_new_str_deletes() {
    let (_dir, editor, file) = setup();
    fs::write(&file, "Line 1\nLine to remove\nLine 3").unwrap();
    editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("Line to remove\n")
                .new_str(""),
        )
        .unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), "Line 1\nLine 3");
}

#[test]
fn str_replace_parameter_checks() {
    let (_dir, editor, file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("str_replace", &file).new_str("x")));
    assert!(msg.contains("old_str"));

    let msg = err_message(
        editor.execute(
            &EditRequest::new("str_replace", &file)
                .old_str("test file")
                .new_str("test file"),
        ),
    );
    assert!(msg.contains("No replacement was performed. `new_str` and `old_str` must be different."));
}

// ---------------------------------------------------------------------------
// insert
// ---------------------------------------------------------------------------

#[test]
fn insert_renders_snippet() {
    let (_dir, editor, file) = setup();
    let out = editor
        .execute(
            &EditRequest::new("insert", &file)
                .insert_line(1)
                .new_str("Inserted line"),
        )
        .unwrap()
        .output
        .unwrap();
    assert_eq!(
        out,
        format!(
            "The file {} has been edited. Here's the result of running `cat -n` on a snippet of the edited file:\n     1\tThis is a test file.\n     2\tInserted line\n     3\tThis file is for testing purposes.\nReview the changes and make sure they are as expected (correct indentation, no duplicate lines, etc). Edit the file again if necessary.",
            file.display()
        )
    );
}

#[test]
fn insert_at_top_and_end() {
    let (_dir, editor, file) = setup();
    editor
        .execute(&EditRequest::new("insert", &file).insert_line(0).new_str("top"))
        .unwrap();
    editor
        .execute(&EditRequest::new("insert", &file).insert_line(3).new_str("bottom"))
        .unwrap();
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "top\nThis is a test file.\nThis file is for testing purposes.\nbottom\n"
    );
}

#[test]
fn insert_empty_string_adds_blank_line() {
    let (_dir, editor, file) = setup();
    editor
        .execute(&EditRequest::new("insert", &file).insert_line(1).new_str(""))
        .unwrap();
    let content = fs::read_to_string(&file).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert_eq!(content.lines().nth(1), Some(""));
}

#[test]
fn insert_out_of_range() {
    let (_dir, editor, file) = setup();
    let msg = err_message(
        editor.execute(
            &EditRequest::new("insert", &file)
                .insert_line(10)
                .new_str("Invalid Insert"),
        ),
    );
    assert_eq!(
        msg,
        "Invalid `insert_line` parameter: 10. It should be within the range of lines of the file: [0, 2]"
    );
}

#[test]
fn insert_requires_parameters() {
    let (_dir, editor, file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("insert", &file).new_str("x")));
    assert!(msg.contains("insert_line"));
    let msg = err_message(editor.execute(&EditRequest::new("insert", &file).insert_line(1)));
    assert!(msg.contains("new_str"));
}

// ---------------------------------------------------------------------------
// undo_edit
// ---------------------------------------------------------------------------

#[test]
fn undo_restores_previous_content() {
    let (_dir, editor, file) = setup();
    editor
        .execute(
            &EditRequest::new("str_replace", &file)
                .old_str("test file")
                .new_str("sample file"),
        )
        .unwrap();
    let result = editor.execute(&EditRequest::new("undo_edit", &file)).unwrap();
    assert!(result
        .output
        .unwrap()
        .starts_with(&format!("Last edit to {} undone successfully. ", file.display())));
    assert_eq!(fs::read_to_string(&file).unwrap(), SAMPLE);
}

#[test]
fn undo_walks_back_several_edits() {
    let (_dir, editor, file) = setup();
    editor
        .execute(&EditRequest::new("insert", &file).insert_line(0).new_str("one"))
        .unwrap();
    editor
        .execute(&EditRequest::new("insert", &file).insert_line(0).new_str("two"))
        .unwrap();
    editor.execute(&EditRequest::new("undo_edit", &file)).unwrap();
    assert!(fs::read_to_string(&file).unwrap().starts_with("one\n"));
    editor.execute(&EditRequest::new("undo_edit", &file)).unwrap();
    assert_eq!(fs::read_to_string(&file).unwrap(), SAMPLE);
}

#[test]
fn undo_without_history() {
    let (_dir, editor, file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("undo_edit", &file)));
    assert_eq!(msg, format!("No edit history found for {}.", file.display()));
}

// ---------------------------------------------------------------------------
// validation
// ---------------------------------------------------------------------------

#[test]
fn unknown_command() {
    let (_dir, editor, file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("delete", &file)));
    assert_eq!(
        msg,
        "Unrecognized command delete. The allowed commands for the oh_editor tool are: view, create, str_replace, insert, undo_edit"
    );
}

#[test]
fn relative_path_is_rejected_with_suggestion() {
    let (_dir, editor, _file) = setup();
    let msg = err_message(editor.execute(&EditRequest::new("view", "relative/test.txt")));
    assert!(msg.starts_with("Invalid `path` parameter: relative/test.txt."));
    assert!(msg.contains("The path should be an absolute path, starting with `/`. Maybe you meant"));
}

#[test]
fn missing_path_and_directory_edits_are_rejected() {
    let (dir, editor, _file) = setup();
    let missing = dir.path().join("nope.txt");
    let msg = err_message(editor.execute(&EditRequest::new("view", &missing)));
    assert!(msg.contains("does not exist. Please provide a valid path."));

    let msg = err_message(editor.execute(&EditRequest::new("undo_edit", dir.path())));
    assert!(msg.contains("is a directory and only the `view` command can be used on directories."));
}

#[test]
fn binary_files_are_rejected() {
    let (dir, editor, _file) = setup();
    let blob = dir.path().join("blob");
    fs::write(&blob, [0u8, 159, 146, 150]).unwrap();
    let msg = err_message(editor.execute(&EditRequest::new("view", &blob)));
    assert_eq!(
        msg,
        format!(
            "File validation failed for {}: File appears to be binary. Only text files can be edited.",
            blob.display()
        )
    );

    let png = dir.path().join("image.png");
    fs::write(&png, [0x89u8, b'P', b'N', b'G', 0, 0]).unwrap();
    let msg = err_message(editor.execute(&EditRequest::new("view", &png)));
    assert!(msg.contains("File type image/png is not supported. Only text files can be edited."));
}

#[test]
fn oversized_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("big.txt");
    fs::write(&file, "x".repeat(2048)).unwrap();
    let editor = Editor::new(EditorConfig {
        max_file_size_mb: 0,
        ..EditorConfig::default()
    })
    .unwrap();
    let msg = err_message(editor.execute(&EditRequest::new("view", &file)));
    assert!(msg.contains("File is too large (0.0MB). Maximum allowed size is 0MB."));
}

#[test]
fn long_files_are_truncated_with_notice() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("long.txt");
    fs::write(&file, "line\n".repeat(100)).unwrap();
    let editor = Editor::new(EditorConfig {
        max_response_len_chars: 50,
        ..EditorConfig::default()
    })
    .unwrap();
    let out = editor
        .execute(&EditRequest::new("view", &file))
        .unwrap()
        .output
        .unwrap();
    assert!(out.contains(crate::results::FILE_CONTENT_TRUNCATED_NOTICE));
}

#[test]
fn request_deserializes_from_agent_json() {
    let req: EditRequest = serde_json::from_str(
        r#"{"command": "view", "path": "/tmp/x", "view_range": [1, -1]}"#,
    )
    .unwrap();
    assert_eq!(req.command, "view");
    assert_eq!(req.view_range, Some(vec![1, -1]));
    assert_eq!(req.old_str, None);
}
