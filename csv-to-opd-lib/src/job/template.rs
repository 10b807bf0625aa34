pub const JOB_TEMPLATE: &str = r#"{
  // Delimited text file to convert. The first line must be the header and
  // one column must be called "Name": its value names each output file.
  // Relative paths are resolved against the directory of this job file.
  "source": "input.csv",

  // Directory receiving one <Name>.opd file per row. Created if missing.
  "output": "out",

  // Column delimiter used by the source file. The actual delimiter is
  // checked against this value before anything is written.
  // One of: tab, comma, semicolon, colon, space, pipe
  "delimiter": "tab",

  // What to do when a row has fewer fields than the header, or a Name value
  // that cannot be a file name:
  //   "prompt"   - ask on the terminal for each bad row
  //   "continue" - skip the row and keep going
  //   "abort"    - stop at the first bad row
  "onRowError": "prompt"
}
"#;
