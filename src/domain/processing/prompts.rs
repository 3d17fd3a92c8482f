//! System directives and user text for each kind of call

const CONCISE_STYLE: &str = "\
Drop filler, hedging, emojis and conversational transitions. \
Do not mirror the user's tone. \
No questions, offers or suggestions at the end. \
Stop as soon as the requested information has been delivered.";

/// Directive for one fragment of a split document
pub fn fragment_directive() -> String {
    format!(
        "You are an assistant specialized in reading and analyzing files.\n\
         You have received one fragment of a large file.\n\
         Perform a preliminary analysis of this fragment following the user's question.\n\
         Your answer will later be consolidated with the analyses of the other fragments.\n\
         Only extract information present in this fragment. If the question cannot be \
         answered from it, say that the information is not in this fragment.\n\n{}",
        CONCISE_STYLE
    )
}

/// Directive for a whole document and for the synthesis over partial analyses
pub const SYNTHESIS_DIRECTIVE: &str = "\
You are an assistant specialized in reading and analyzing files.
When the file was too large it has been split into fragments that were analyzed separately.
Consolidate the available information into one final answer.
Do not mention fragments, partial answers or the fact that the file was split.
Answer EXCLUSIVELY from the provided information.";

/// Directive for combining the answers obtained from several files
pub const JOIN_DIRECTIVE: &str = "\
You are an assistant specialized in reading and analyzing files.
You have processed several files separately for the user's question. Consolidate all responses into a single final response.
The user knows which files have been processed and may refer to them in the question.
You may reference individual files when relevant.
Answer EXCLUSIVELY from the content of the provided files.";

/// User text accompanying a fragment payload
pub fn fragment_text(question: &str) -> String {
    format!(
        "This is a fragment of the file. The user's question is: ```{}```.",
        question
    )
}

/// User text accompanying a whole-file payload
pub fn whole_document_text(question: &str) -> String {
    format!("The user's question is: ```{}```.", question)
}

/// User text of the synthesis call over consolidated partial analyses
pub fn synthesis_text(fragments: usize, context: &str, question: &str) -> String {
    format!(
        "STATUS: {fragments} fragments of the original file have been analyzed.\n\
         Below are the partial analyses extracted from each fragment:\n\n\
         {context}\n\n\
         ---------------------------------------------------------------------\n\
         FINAL INSTRUCTION:\n\
         Based EXCLUSIVELY on the consolidated information above, respond to the following user request.\n\
         If information is repeated across multiple fragments, unify it.\n\
         If there are contradictions, point out the discrepancy.\n\n\
         USER REQUEST:\n\
         \"{question}\""
    )
}

/// User text of the join call over per-file answers
pub fn join_text(answers: &[(String, String)], question: &str) -> String {
    let mut text = String::new();
    for (name, answer) in answers {
        text.push_str(&format!("FILE: {}\n{}\n\n", name, answer));
    }
    text.push_str(&format!("USER REQUEST:\n\"{}\"", question));
    text
}
