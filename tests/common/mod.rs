#![allow(dead_code)]

use auto_tracker_swc_plugin::{TrackerConfig, TrackerTransform};
use swc_core::{
    common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap},
    ecma::{
        ast::{EsVersion, Program},
        codegen::{text_writer::JsWriter, Config, Emitter},
        parser::{parse_file_as_module, parse_file_as_script, EsSyntax, Syntax},
        visit::VisitMutWith,
    },
};

#[derive(Clone, Copy)]
pub enum Kind {
    Module,
    Script,
}

fn parse(cm: &Lrc<SourceMap>, src: &str, kind: Kind, comments: &SingleThreadedComments) -> Program {
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), src.to_string());
    let syntax = Syntax::Es(EsSyntax::default());
    let mut errors = vec![];
    let program = match kind {
        Kind::Module => {
            parse_file_as_module(&fm, syntax, EsVersion::latest(), Some(comments), &mut errors)
                .map(Program::Module)
        }
        Kind::Script => {
            parse_file_as_script(&fm, syntax, EsVersion::latest(), Some(comments), &mut errors)
                .map(Program::Script)
        }
    };
    assert!(errors.is_empty(), "recovered parse errors in {src:?}");
    program.unwrap_or_else(|err| panic!("failed to parse {src:?}: {err:?}"))
}

fn print(cm: &Lrc<SourceMap>, program: &Program) -> String {
    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: Config::default(),
            cm: cm.clone(),
            comments: None,
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        emitter.emit_program(program).expect("failed to print program");
    }
    String::from_utf8(buf).expect("printer produced invalid utf-8")
}

pub fn transform_as(src: &str, kind: Kind, config: TrackerConfig) -> String {
    let cm: Lrc<SourceMap> = Default::default();
    let comments = SingleThreadedComments::default();
    let mut program = parse(&cm, src, kind, &comments);
    program.visit_mut_with(&mut TrackerTransform::new(config, comments.clone()));
    print(&cm, &program)
}

pub fn transform(src: &str) -> String {
    transform_as(src, Kind::Module, TrackerConfig::default())
}

/// Prints `src` without transforming it, so expectations share the printer's layout.
pub fn reprint(src: &str, kind: Kind) -> String {
    let cm: Lrc<SourceMap> = Default::default();
    let comments = SingleThreadedComments::default();
    let program = parse(&cm, src, kind, &comments);
    print(&cm, &program)
}

fn squash(code: &str) -> String {
    code.split_whitespace().collect()
}

pub fn assert_same_code(actual: &str, expected: &str, kind: Kind) {
    pretty_assertions::assert_eq!(squash(actual), squash(&reprint(expected, kind)));
}

pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
