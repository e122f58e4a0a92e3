//! This module defines a few small treebanks that can be useful in testing or otherwise.

///Three toy sentences in bracketed form.
pub const TOY_TREEBANK: &str = "(S (NP (DT the) (NN dog)) (VP (VBZ barks)))
(S (NP (DT the) (JJ black) (NN cat)) (VP (VBZ sees) (NP (DT a) (NN dog))))
(S (VP (VB run)))
";

///The first two sentences of the Wall Street Journal section of the Penn Treebank, as they
///appear in its `.mrg` files (each tree is wrapped in an unlabeled root).
pub const PTB_SAMPLE: &str = "( (S
    (NP-SBJ
      (NP (NNP Pierre) (NNP Vinken) )
      (, ,)
      (ADJP
        (NP (CD 61) (NNS years) )
        (JJ old) )
      (, ,) )
    (VP (MD will)
      (VP (VB join)
        (NP (DT the) (NN board) )
        (PP-CLR (IN as)
          (NP (DT a) (JJ nonexecutive) (NN director) ))
        (NP-TMP (NNP Nov.) (CD 29) )))
    (. .) ))
( (S
    (NP-SBJ (NNP Mr.) (NNP Vinken) )
    (VP (VBZ is)
      (NP-PRD
        (NP (NN chairman) )
        (PP (IN of)
          (NP
            (NP (NNP Elsevier) (NNP N.V.) )
            (, ,)
            (NP (DT the) (NNP Dutch) (VBG publishing) (NN group) )))))
    (. .) ))
";

///A quoted sentence in the `.mrg` style, with the opening and closing quotation tags `` `` ``
///and `''`.
pub const QUOTATION_SAMPLE: &str = "( (S
    (`` ``)
    (NP-SBJ (PRP We) )
    (VP (VBP have)
      (NP (DT no) (JJ useful) (NN information) ))
    (, ,)
    ('' '')
    (NP-SBJ-1 (PRP he) )
    (VP (VBD said) )
    (. .) ))
";
